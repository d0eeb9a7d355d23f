/// Custom rule application
///
/// A rule fires when all of its conditions hold for the player; its effect
/// then mutates base points, issues a penalty, or grants a power-up.
use chrono::{DateTime, Utc};
use log::debug;

use crate::game::condition::{evaluate_all, EvalContext};
use crate::game::occasion::Occasion;
use crate::game::penalty::{apply_penalty, PenaltyOutcome};
use crate::game::power_up::{activate_power_up, Activation};
use crate::game::rules::RuleBook;
use crate::game::types::{
    CustomRule, GameMode, Penalty, PenaltyType, Player, PlayerId, PowerUpType, RuleEffect, Team,
};

/// Duration used for rule-issued silences and power-ups that do not name one.
pub const DEFAULT_EFFECT_DURATION_MS: i64 = 60_000;

/// Shared inputs for rule evaluation and effects
#[derive(Debug, Clone, Copy)]
pub struct RuleEnv<'a> {
    pub team: Option<&'a Team>,
    pub now: DateTime<Utc>,
    pub occasion: Option<Occasion>,
    pub max_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppliedEffect {
    PointsAdded(u32),
    /// Points actually removed (base points floor at zero)
    PointsDeducted(u32),
    Penalty(PenaltyType, PenaltyOutcome),
    PowerUp(PowerUpType, Activation),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    NotTriggered,
    Applied(AppliedEffect),
}

impl RuleOutcome {
    pub fn fired(&self) -> bool {
        matches!(self, RuleOutcome::Applied(_))
    }
}

/// Whether every condition of `rule` holds for the player.
pub fn rule_triggers(rule: &CustomRule, player: &Player, env: &RuleEnv<'_>) -> bool {
    let ctx = EvalContext::new(player, env.now)
        .with_team(env.team)
        .with_occasion(env.occasion);
    evaluate_all(&rule.conditions, &ctx)
}

/// Evaluate the rule and apply its effect when it triggers.
pub fn apply_custom_rule(player: &mut Player, rule: &CustomRule, env: &RuleEnv<'_>) -> RuleOutcome {
    if !rule_triggers(rule, player, env) {
        return RuleOutcome::NotTriggered;
    }
    let effect = apply_rule_effect(player, rule, env.now, env.max_multiplier);
    debug!("rule '{}' fired for {}: {:?}", rule.name, player.name, effect);
    RuleOutcome::Applied(effect)
}

/// Apply the rule's effect unconditionally.
pub fn apply_rule_effect(
    player: &mut Player,
    rule: &CustomRule,
    now: DateTime<Utc>,
    max_multiplier: f64,
) -> AppliedEffect {
    let duration_ms = rule.duration_ms.unwrap_or(DEFAULT_EFFECT_DURATION_MS);

    match &rule.effect {
        RuleEffect::AddPoints => {
            player.base_points = player.base_points.saturating_add(rule.magnitude);
            AppliedEffect::PointsAdded(rule.magnitude)
        }
        RuleEffect::DeductPoints => {
            let removed = rule.magnitude.min(player.base_points);
            player.base_points -= removed;
            AppliedEffect::PointsDeducted(removed)
        }
        RuleEffect::SilencePlayer => {
            let penalty = Penalty::new(PenaltyType::Silenced, rule.magnitude, now)
                .with_duration_ms(duration_ms)
                .with_reason(&rule.name);
            AppliedEffect::Penalty(PenaltyType::Silenced, apply_penalty(player, penalty))
        }
        RuleEffect::DoublePoints => {
            let activation = activate_power_up(
                player,
                PowerUpType::DoublePoints,
                duration_ms,
                2.0,
                now,
                max_multiplier,
            );
            AppliedEffect::PowerUp(PowerUpType::DoublePoints, activation)
        }
        RuleEffect::PowerUpReward { power_up } => {
            let activation = activate_power_up(
                player,
                *power_up,
                duration_ms,
                f64::from(rule.magnitude),
                now,
                max_multiplier,
            );
            AppliedEffect::PowerUp(*power_up, activation)
        }
        RuleEffect::CustomPenalty => {
            let mut penalty =
                Penalty::new(PenaltyType::Other, rule.magnitude, now).with_reason(&rule.name);
            penalty.duration_ms = rule.duration_ms;
            AppliedEffect::Penalty(PenaltyType::Other, apply_penalty(player, penalty))
        }
    }
}

/// Apply the mode's rule set to every player, in roster order.
pub fn apply_custom_rules_for_game(
    players: &mut [Player],
    mode: GameMode,
    book: &RuleBook,
    env: &RuleEnv<'_>,
) -> Vec<(PlayerId, String, RuleOutcome)> {
    let rules = book.rules_for(mode);
    let mut results = Vec::with_capacity(players.len() * rules.len());
    for player in players.iter_mut() {
        for rule in rules {
            let outcome = apply_custom_rule(player, rule, env);
            results.push((player.id, rule.name.clone(), outcome));
        }
    }
    results
}
