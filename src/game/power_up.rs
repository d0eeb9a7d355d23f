/// Power-up activation and expiry.
///
/// Activating a type that is already active refreshes it in place: the timer
/// restarts at `now` with the new duration and the effect becomes the larger
/// of the two values, capped for multiplier types. One instance per type
/// exists at any time.
use chrono::{DateTime, Utc};
use log::debug;

use crate::game::types::{Player, PowerUp, PowerUpType};

/// Default ceiling for a single multiplier power-up.
pub const DEFAULT_MAX_MULTIPLIER: f64 = 5.0;

/// Whether an activation created a new power-up or refreshed an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Activated,
    Refreshed,
}

/// Activate (or refresh) a power-up on the player.
pub fn activate_power_up(
    player: &mut Player,
    kind: PowerUpType,
    duration_ms: i64,
    effect_value: f64,
    now: DateTime<Utc>,
    max_multiplier: f64,
) -> Activation {
    let effect = normalize_effect(kind, effect_value, max_multiplier);

    if let Some(existing) = player.power_ups.iter_mut().find(|pu| pu.kind == kind) {
        existing.activated_at = now;
        existing.duration_ms = duration_ms;
        existing.effect_value = existing.effect_value.max(effect);
        debug!(
            "{} refreshed {} ({}ms, effect {})",
            player.name, kind, duration_ms, existing.effect_value
        );
        return Activation::Refreshed;
    }

    player
        .power_ups
        .push(PowerUp::new(kind, now, duration_ms, effect));
    debug!("{} activated {} ({}ms, effect {})", player.name, kind, duration_ms, effect);
    Activation::Activated
}

/// Remove power-ups whose time is up and return them.
pub fn check_for_expired_power_ups(player: &mut Player, now: DateTime<Utc>) -> Vec<PowerUp> {
    let (expired, remaining): (Vec<_>, Vec<_>) = player
        .power_ups
        .drain(..)
        .partition(|pu| pu.is_expired(now));
    player.power_ups = remaining;
    expired
}

pub fn clear_active_power_ups(player: &mut Player) {
    player.power_ups.clear();
}

pub fn has_active(player: &Player, kind: PowerUpType) -> bool {
    player.power_ups.iter().any(|pu| pu.kind == kind)
}

fn normalize_effect(kind: PowerUpType, effect_value: f64, max_multiplier: f64) -> f64 {
    let value = if effect_value.is_finite() {
        effect_value.max(0.0)
    } else {
        0.0
    };
    match kind {
        PowerUpType::DoublePoints => 2.0,
        PowerUpType::ScoreMultiplier => value.min(max_multiplier.max(1.0)),
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::score::calculate_player_score;
    use chrono::Duration;

    #[test]
    fn same_type_refreshes_instead_of_stacking() {
        let t0 = Utc::now();
        let mut player = Player::new("alice");
        player.base_points = 5;

        let first =
            activate_power_up(&mut player, PowerUpType::DoublePoints, 10_000, 2.0, t0, 5.0);
        let t1 = t0 + Duration::seconds(8);
        let second =
            activate_power_up(&mut player, PowerUpType::DoublePoints, 10_000, 2.0, t1, 5.0);

        assert_eq!(first, Activation::Activated);
        assert_eq!(second, Activation::Refreshed);
        assert_eq!(player.power_ups.len(), 1);
        assert_eq!(calculate_player_score(&player), 10);

        // original window would have closed at t0 + 10s
        let expired = check_for_expired_power_ups(&mut player, t0 + Duration::seconds(12));
        assert!(expired.is_empty());
        let expired = check_for_expired_power_ups(&mut player, t1 + Duration::seconds(10));
        assert_eq!(expired.len(), 1);
        assert_eq!(calculate_player_score(&player), 5);
    }

    #[test]
    fn multiplier_effect_is_capped_and_keeps_the_larger_value() {
        let now = Utc::now();
        let mut player = Player::new("bob");
        activate_power_up(&mut player, PowerUpType::ScoreMultiplier, 1_000, 3.0, now, 4.0);
        activate_power_up(&mut player, PowerUpType::ScoreMultiplier, 1_000, 1.5, now, 4.0);
        assert_eq!(player.power_ups[0].effect_value, 3.0);
        activate_power_up(&mut player, PowerUpType::ScoreMultiplier, 1_000, 9.0, now, 4.0);
        assert_eq!(player.power_ups[0].effect_value, 4.0);
    }

    #[test]
    fn different_types_coexist() {
        let now = Utc::now();
        let mut player = Player::new("carol");
        activate_power_up(&mut player, PowerUpType::DoublePoints, 1_000, 2.0, now, 5.0);
        activate_power_up(&mut player, PowerUpType::Shield, 1_000, 1.0, now, 5.0);
        assert!(has_active(&player, PowerUpType::DoublePoints));
        assert!(has_active(&player, PowerUpType::Shield));
        clear_active_power_ups(&mut player);
        assert!(player.power_ups.is_empty());
    }

    #[test]
    fn open_ended_power_up_stays_through_cleanup() {
        let now = Utc::now();
        let mut player = Player::new("dana");
        activate_power_up(&mut player, PowerUpType::Immunity, i64::MAX, 1.0, now, 5.0);
        let expired = check_for_expired_power_ups(&mut player, now + Duration::days(10_000));
        assert!(expired.is_empty());
        assert!(has_active(&player, PowerUpType::Immunity));
    }
}
