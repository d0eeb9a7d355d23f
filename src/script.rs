//! Replayable game scripts.
//!
//! A script is a JSON array of steps played against a `GameEngine` driven by
//! a `ManualClock`, so timed effects can be exercised without waiting:
//!
//! ```json
//! [
//!   { "add_player": { "name": "Alice" } },
//!   { "start": { "mode": "classic", "minutes": 20 } },
//!   { "call": { "player": "Alice", "call": "water tower" } },
//!   { "advance": { "seconds": 90 } },
//!   "stop"
//! ]
//! ```
//!
//! Players are referenced by name (case-insensitive).

use std::fs;
use std::path::Path;

use chrono::Duration;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::engine::{EventOutcome, GameEngine};
use crate::game::ports::{Clock, GameStorage, ManualClock, NotificationSink};
use crate::game::types::{CustomRule, GameMode, Penalty, PenaltyType, PlayerId, PowerUpType};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("step {step}: no player named '{name}'")]
    UnknownPlayer { step: usize, name: String },
    #[error("step {step}: {field} out of range")]
    OutOfRange { step: usize, field: &'static str },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    AddPlayer {
        name: String,
    },
    RemovePlayer {
        player: String,
    },
    Start {
        #[serde(default)]
        mode: Option<GameMode>,
        /// 0 plays until stopped
        #[serde(default)]
        minutes: Option<u32>,
    },
    Call {
        player: String,
        call: String,
    },
    Found {
        player: String,
        item: String,
    },
    Answer {
        player: String,
        answer: String,
    },
    ToggleTeam {
        player: String,
    },
    Penalty {
        player: String,
        kind: PenaltyType,
        #[serde(default)]
        magnitude: u32,
        #[serde(default)]
        seconds: Option<i64>,
        #[serde(default)]
        reason: Option<String>,
    },
    PowerUp {
        player: String,
        kind: PowerUpType,
        seconds: i64,
        #[serde(default = "default_effect")]
        effect: f64,
    },
    Rule {
        player: String,
        rule: CustomRule,
    },
    Advance {
        seconds: i64,
    },
    Pause,
    Resume,
    Stop,
    Reset,
}

fn default_effect() -> f64 {
    1.0
}

/// Mode and length used by `start` steps that leave them out
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayDefaults {
    pub mode: GameMode,
    pub duration_ms: Option<i64>,
}

/// What a replay did
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub steps: usize,
    /// Events that went through the scoring pipeline
    pub outcomes: Vec<EventOutcome>,
    /// Steps the engine declined (wrong state, suppressed player, duplicate find)
    pub rejected: usize,
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<ScriptStep>, ScriptError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_script(&contents)
}

/// Play `steps` in order. Stops at the first step naming an unknown player.
pub fn replay<S, N>(
    engine: &mut GameEngine<S, N, ManualClock>,
    steps: &[ScriptStep],
    defaults: ReplayDefaults,
) -> Result<ReplayReport, ScriptError>
where
    S: GameStorage,
    N: NotificationSink,
{
    let mut report = ReplayReport::default();

    for (n, step) in steps.iter().enumerate() {
        let step_no = n + 1;
        debug!("script step {}: {:?}", step_no, step);
        let accepted = match step {
            ScriptStep::AddPlayer { name } => {
                engine.add_player(name);
                true
            }
            ScriptStep::RemovePlayer { player } => {
                let id = lookup(engine, step_no, player)?;
                engine.remove_player(&id)
            }
            ScriptStep::Start { mode, minutes } => {
                let duration_ms = match minutes {
                    Some(0) => None,
                    Some(m) => Some(i64::from(*m) * 60_000),
                    None => defaults.duration_ms,
                };
                engine.start_game(mode.unwrap_or(defaults.mode), duration_ms)
            }
            ScriptStep::Call { player, call } => {
                let id = lookup(engine, step_no, player)?;
                record(&mut report, engine.handle_call(&id, call))
            }
            ScriptStep::Found { player, item } => {
                let id = lookup(engine, step_no, player)?;
                record(&mut report, engine.handle_scavenger_hunt_item_found(&id, item))
            }
            ScriptStep::Answer { player, answer } => {
                let id = lookup(engine, step_no, player)?;
                record(&mut report, engine.handle_trivia_question_answer(&id, answer))
            }
            ScriptStep::ToggleTeam { player } => {
                let id = lookup(engine, step_no, player)?;
                engine.toggle_player_team_status(&id).is_some()
            }
            ScriptStep::Penalty {
                player,
                kind,
                magnitude,
                seconds,
                reason,
            } => {
                let id = lookup(engine, step_no, player)?;
                let mut penalty = Penalty::new(*kind, *magnitude, engine.clock().now());
                if let Some(secs) = seconds {
                    penalty = penalty.with_duration_ms(seconds_to_ms(step_no, *secs)?);
                }
                if let Some(reason) = reason {
                    penalty = penalty.with_reason(reason);
                }
                engine.apply_penalty_to_player(&id, penalty).is_some()
            }
            ScriptStep::PowerUp {
                player,
                kind,
                seconds,
                effect,
            } => {
                let id = lookup(engine, step_no, player)?;
                let duration_ms = seconds_to_ms(step_no, *seconds)?;
                engine
                    .activate_power_up_for_player(&id, *kind, duration_ms, *effect)
                    .is_some()
            }
            ScriptStep::Rule { player, rule } => {
                let id = lookup(engine, step_no, player)?;
                engine.assign_custom_rule(&id, rule.clone())
            }
            ScriptStep::Advance { seconds } => {
                let by = Duration::try_seconds(*seconds).ok_or(ScriptError::OutOfRange {
                    step: step_no,
                    field: "seconds",
                })?;
                engine.clock_mut().advance(by);
                true
            }
            ScriptStep::Pause => engine.pause_game(),
            ScriptStep::Resume => engine.resume_game(),
            ScriptStep::Stop => engine.stop_game(),
            ScriptStep::Reset => {
                engine.reset_game();
                true
            }
        };
        if !accepted {
            report.rejected += 1;
        }
        report.steps += 1;
    }

    info!(
        "Replayed {} steps ({} scored events, {} rejected)",
        report.steps,
        report.outcomes.len(),
        report.rejected
    );
    Ok(report)
}

fn lookup<S, N>(
    engine: &GameEngine<S, N, ManualClock>,
    step: usize,
    name: &str,
) -> Result<PlayerId, ScriptError>
where
    S: GameStorage,
    N: NotificationSink,
{
    engine
        .players()
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .map(|p| p.id)
        .ok_or_else(|| ScriptError::UnknownPlayer {
            step,
            name: name.to_string(),
        })
}

fn seconds_to_ms(step: usize, seconds: i64) -> Result<i64, ScriptError> {
    seconds
        .checked_mul(1000)
        .ok_or(ScriptError::OutOfRange {
            step,
            field: "seconds",
        })
}

fn record(report: &mut ReplayReport, outcome: Option<EventOutcome>) -> bool {
    match outcome {
        Some(outcome) => {
            report.outcomes.push(outcome);
            true
        }
        None => false,
    }
}
