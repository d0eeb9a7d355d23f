//! Score aggregation and the call point table.
//!
//! A player's total is never stored. It is derived on every read from base
//! points, active penalties and active power-ups:
//!
//! 1. start from `base_points`
//! 2. subtract active `PointDeduction` magnitudes (may go negative)
//! 3. multiply by `DoublePoints` (x2) and `ScoreMultiplier` (x effect) power-ups
//! 4. add `BonusPoints` power-ups
//! 5. floor the result at zero
//!
//! Team totals are a fresh sum over the members every time.

use crate::game::types::{ObjectType, PenaltyType, Player, PlayerId, PowerUpType, Team};

/// Compute a player's current total score.
pub fn calculate_player_score(player: &Player) -> u32 {
    let deductions: i64 = player
        .penalties
        .iter()
        .filter(|p| p.kind == PenaltyType::PointDeduction)
        .map(|p| i64::from(p.magnitude))
        .sum();
    let adjusted = i64::from(player.base_points) - deductions;

    let multiplier = score_multiplier(player);
    let bonus: f64 = player
        .power_ups
        .iter()
        .filter(|pu| pu.kind == PowerUpType::BonusPoints)
        .map(|pu| pu.effect_value.max(0.0))
        .sum();

    let total = (adjusted as f64 * multiplier).round() + bonus.round();
    if total <= 0.0 {
        0
    } else if total >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        total as u32
    }
}

/// Product of every active multiplicative power-up.
pub fn score_multiplier(player: &Player) -> f64 {
    player
        .power_ups
        .iter()
        .filter_map(|pu| match pu.kind {
            PowerUpType::DoublePoints => Some(2.0),
            PowerUpType::ScoreMultiplier => Some(pu.effect_value.max(0.0)),
            _ => None,
        })
        .product()
}

/// Sum of member scores. Ids with no matching player contribute nothing.
pub fn calculate_total_team_score(team: &Team, players: &[Player]) -> u32 {
    team.members
        .iter()
        .filter_map(|id| find(players, id))
        .map(calculate_player_score)
        .fold(0u32, u32::saturating_add)
}

fn find<'a>(players: &'a [Player], id: &PlayerId) -> Option<&'a Player> {
    players.iter().find(|p| p.id == *id)
}

// ============================================================================
// Calls
// ============================================================================

/// Points a raw call is worth; unknown calls are worth nothing.
pub fn points_for_call(call: &str) -> u32 {
    ObjectType::parse(call).map_or(0, |object| object.points())
}

/// Whether the player may make this call right now.
pub fn validate_call(player: &Player, call: &str) -> bool {
    player.can_act() && ObjectType::parse(call).is_some()
}

/// Resolve a raw call and credit it to the player. Unknown calls return 0
/// and leave the player untouched.
pub fn apply_points(player: &mut Player, call: &str) -> u32 {
    match ObjectType::parse(call) {
        Some(object) => award_object(player, object),
        None => 0,
    }
}

/// Credit a spotted object: bumps the matching counter and base points.
pub fn award_object(player: &mut Player, object: ObjectType) -> u32 {
    let points = object.points();
    match object {
        ObjectType::Cow => player.cow_count += 1,
        ObjectType::Church => player.church_count += 1,
        ObjectType::WaterTower => player.water_tower_count += 1,
        ObjectType::RainbowCar(_) => player.rainbow_car_count += 1,
    }
    player.base_points = player.base_points.saturating_add(points);
    points
}

/// Players ordered by score, highest first; ties broken by name.
pub fn leaderboard(players: &[Player]) -> Vec<(&Player, u32)> {
    let mut ranked: Vec<_> = players
        .iter()
        .map(|p| (p, calculate_player_score(p)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(&b.0.name)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::{Penalty, PowerUp};
    use chrono::Utc;

    fn player_with_points(name: &str, points: u32) -> Player {
        let mut p = Player::new(name);
        p.base_points = points;
        p
    }

    #[test]
    fn deduction_larger_than_score_floors_at_zero() {
        let mut p = player_with_points("alice", 10);
        p.penalties
            .push(Penalty::new(PenaltyType::PointDeduction, 15, Utc::now()));
        assert_eq!(calculate_player_score(&p), 0);
    }

    #[test]
    fn double_points_doubles_base() {
        let mut p = Player::new("bob");
        p.power_ups
            .push(PowerUp::new(PowerUpType::DoublePoints, Utc::now(), 60_000, 2.0));
        p.base_points = 5;
        assert_eq!(calculate_player_score(&p), 10);
    }

    #[test]
    fn multipliers_compose_then_bonus_is_added() {
        let now = Utc::now();
        let mut p = player_with_points("carol", 12);
        p.penalties.push(Penalty::new(PenaltyType::PointDeduction, 2, now));
        p.power_ups
            .push(PowerUp::new(PowerUpType::DoublePoints, now, 60_000, 2.0));
        p.power_ups
            .push(PowerUp::new(PowerUpType::ScoreMultiplier, now, 60_000, 1.5));
        p.power_ups
            .push(PowerUp::new(PowerUpType::BonusPoints, now, 60_000, 4.0));
        // (12 - 2) * 2 * 1.5 + 4
        assert_eq!(calculate_player_score(&p), 34);
    }

    #[test]
    fn bonus_cannot_lift_a_deficit_above_zero() {
        let now = Utc::now();
        let mut p = player_with_points("dave", 10);
        p.penalties
            .push(Penalty::new(PenaltyType::PointDeduction, 15, now));
        p.power_ups
            .push(PowerUp::new(PowerUpType::BonusPoints, now, 60_000, 5.0));
        // 10 - 15 + 5
        assert_eq!(calculate_player_score(&p), 0);

        p.power_ups
            .push(PowerUp::new(PowerUpType::DoublePoints, now, 60_000, 2.0));
        // (10 - 15) * 2 + 5
        assert_eq!(calculate_player_score(&p), 0);
    }

    #[test]
    fn bonus_offsets_part_of_a_deficit() {
        let now = Utc::now();
        let mut p = player_with_points("dana", 10);
        p.penalties
            .push(Penalty::new(PenaltyType::PointDeduction, 12, now));
        p.power_ups
            .push(PowerUp::new(PowerUpType::BonusPoints, now, 60_000, 5.0));
        assert_eq!(calculate_player_score(&p), 3);
    }

    #[test]
    fn non_deduction_penalties_do_not_touch_score() {
        let now = Utc::now();
        let mut p = player_with_points("erin", 7);
        p.penalties.push(Penalty::new(PenaltyType::Silenced, 50, now));
        p.penalties.push(Penalty::new(PenaltyType::FalseCall, 50, now));
        assert_eq!(calculate_player_score(&p), 7);
    }

    #[test]
    fn apply_points_church() {
        let mut p = player_with_points("frank", 4);
        assert_eq!(apply_points(&mut p, "Church"), 2);
        assert_eq!(p.base_points, 6);
        assert_eq!(p.church_count, 1);
    }

    #[test]
    fn unknown_call_is_worth_nothing() {
        let mut p = player_with_points("gina", 4);
        assert_eq!(apply_points(&mut p, "Tractor"), 0);
        assert_eq!(p.base_points, 4);
        assert_eq!(points_for_call("Tractor"), 0);
        assert!(!validate_call(&p, "Tractor"));
    }

    #[test]
    fn silenced_player_cannot_call() {
        let mut p = Player::new("hank");
        assert!(validate_call(&p, "cow"));
        p.silenced = true;
        assert!(!validate_call(&p, "cow"));
    }

    #[test]
    fn team_score_tracks_membership_exactly() {
        let alice = player_with_points("alice", 8);
        let bob = player_with_points("bob", 5);
        let players = vec![alice.clone(), bob.clone()];

        let mut team = Team::new("Moo Crew");
        team.members.push(alice.id);
        let before = calculate_total_team_score(&team, &players);
        assert_eq!(before, 8);

        team.members.push(bob.id);
        let after = calculate_total_team_score(&team, &players);
        assert_eq!(after - before, calculate_player_score(&bob));

        team.members.retain(|id| *id != alice.id);
        assert_eq!(calculate_total_team_score(&team, &players), 5);
    }

    #[test]
    fn leaderboard_orders_by_score_then_name() {
        let players = vec![
            player_with_points("zed", 3),
            player_with_points("amy", 9),
            player_with_points("bea", 3),
        ];
        let names: Vec<_> = leaderboard(&players)
            .into_iter()
            .map(|(p, _)| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["amy", "bea", "zed"]);
    }
}
