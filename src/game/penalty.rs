/// Penalty lifecycle: apply, expire, clear.
///
/// Silences and temporary bans also raise a suppression flag on the player;
/// callers check `Player::can_act` before honouring further calls.
use chrono::{DateTime, Utc};
use log::debug;

use crate::game::types::{Penalty, PenaltyType, Player, PowerUpType};

/// What happened to a penalty handed to `apply_penalty`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyOutcome {
    Applied,
    /// An active Immunity power-up blocked it
    Blocked,
    /// An active Shield took the hit and broke
    Absorbed,
}

/// Apply a penalty to a player. Penalties stack, including on a player who
/// is already banned.
pub fn apply_penalty(player: &mut Player, penalty: Penalty) -> PenaltyOutcome {
    let at = penalty.started_at;
    let active = |kind: PowerUpType| {
        player
            .power_ups
            .iter()
            .position(|pu| pu.kind == kind && !pu.is_expired(at))
    };

    if active(PowerUpType::Immunity).is_some() {
        debug!("{} is immune, {:?} penalty blocked", player.name, penalty.kind);
        return PenaltyOutcome::Blocked;
    }
    if let Some(idx) = active(PowerUpType::Shield) {
        player.power_ups.remove(idx);
        debug!("{}'s shield absorbed a {:?} penalty", player.name, penalty.kind);
        return PenaltyOutcome::Absorbed;
    }

    match penalty.kind {
        PenaltyType::Silenced => player.silenced = true,
        PenaltyType::TemporaryBan => player.banned = true,
        _ => {}
    }
    player.penalties.push(penalty);
    PenaltyOutcome::Applied
}

/// Drop every penalty with `start + duration <= now` and return them.
/// Suppression flags are lowered once no penalty of that kind remains.
pub fn remove_expired_penalties(player: &mut Player, now: DateTime<Utc>) -> Vec<Penalty> {
    let (expired, remaining): (Vec<_>, Vec<_>) = player
        .penalties
        .drain(..)
        .partition(|p| p.is_expired(now));
    player.penalties = remaining;

    if !expired.is_empty() {
        refresh_suppression(player);
    }
    expired
}

/// Remove all penalties and lift suppression (game reset).
pub fn clear_player_penalties(player: &mut Player) {
    player.penalties.clear();
    player.silenced = false;
    player.banned = false;
}

fn refresh_suppression(player: &mut Player) {
    let has = |kind: PenaltyType| player.penalties.iter().any(|p| p.kind == kind);
    let silenced = has(PenaltyType::Silenced);
    let banned = has(PenaltyType::TemporaryBan);
    player.silenced = silenced;
    player.banned = banned;
}
