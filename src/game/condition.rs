/// Condition evaluation for custom rules
///
/// Conditions are pure predicates over a player snapshot, the player's team
/// (if any), the current time and the occasion in effect.
use chrono::{DateTime, NaiveTime, Utc};

use crate::game::occasion::Occasion;
use crate::game::score::calculate_player_score;
use crate::game::types::{Condition, ConditionKind, Player, Team};

/// Everything a condition may look at
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub player: &'a Player,
    pub team: Option<&'a Team>,
    pub now: DateTime<Utc>,
    pub occasion: Option<Occasion>,
}

impl<'a> EvalContext<'a> {
    pub fn new(player: &'a Player, now: DateTime<Utc>) -> Self {
        Self {
            player,
            team: None,
            now,
            occasion: None,
        }
    }

    pub fn with_team(mut self, team: Option<&'a Team>) -> Self {
        self.team = team;
        self
    }

    pub fn with_occasion(mut self, occasion: Option<Occasion>) -> Self {
        self.occasion = occasion;
        self
    }
}

/// Evaluate a single condition.
pub fn evaluate(condition: &Condition, ctx: &EvalContext<'_>) -> bool {
    match &condition.kind {
        ConditionKind::Always => true,
        ConditionKind::ScoreBelow { threshold } => calculate_player_score(ctx.player) < *threshold,
        ConditionKind::ScoreAbove { threshold } => calculate_player_score(ctx.player) > *threshold,
        ConditionKind::TimeWindow { start, end } => in_window(ctx.now.time(), *start, *end),
        ConditionKind::SpecialEventActive { occasion } => ctx.occasion == Some(*occasion),
        ConditionKind::TeamBased => ctx.player.is_on_team(),
    }
}

/// Logical AND over all conditions; an empty list holds.
pub fn evaluate_all(conditions: &[Condition], ctx: &EvalContext<'_>) -> bool {
    conditions.iter().all(|c| evaluate(c, ctx))
}

fn in_window(time: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end {
        start <= time && time < end
    } else {
        // wraps midnight
        time >= start || time < end
    }
}
