/// Achievement tracking
///
/// Progress only ever goes up and an unlocked achievement stays unlocked.
/// Counter-backed achievements are re-derived from the player's tallies by
/// `check_achievements`; event-only ones (team play) advance through
/// `track_progress`.
use chrono::{DateTime, Utc};

use crate::game::score::calculate_player_score;
use crate::game::types::{AchievementKind, Player, PlayerAchievement};

/// Static description of an achievement
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementDefinition {
    pub kind: AchievementKind,
    pub name: &'static str,
    pub description: &'static str,
    pub goal: u32,
}

const CATALOG: [AchievementDefinition; 9] = [
    AchievementDefinition {
        kind: AchievementKind::FirstCow,
        name: "Moo!",
        description: "Spot your first cow",
        goal: 1,
    },
    AchievementDefinition {
        kind: AchievementKind::CowHerder,
        name: "Cow Herder",
        description: "Spot 25 cows",
        goal: 25,
    },
    AchievementDefinition {
        kind: AchievementKind::ChurchGoer,
        name: "Church Goer",
        description: "Spot 10 churches",
        goal: 10,
    },
    AchievementDefinition {
        kind: AchievementKind::TowerSpotter,
        name: "Tower Spotter",
        description: "Spot 5 water towers",
        goal: 5,
    },
    AchievementDefinition {
        kind: AchievementKind::RainbowChaser,
        name: "Rainbow Chaser",
        description: "Spot 7 rainbow cars",
        goal: 7,
    },
    AchievementDefinition {
        kind: AchievementKind::ScavengerMaster,
        name: "Scavenger Master",
        description: "Find 10 scavenger hunt items",
        goal: 10,
    },
    AchievementDefinition {
        kind: AchievementKind::TriviaWhiz,
        name: "Trivia Whiz",
        description: "Answer 10 trivia questions correctly",
        goal: 10,
    },
    AchievementDefinition {
        kind: AchievementKind::PointCollector,
        name: "Point Collector",
        description: "Reach a score of 100",
        goal: 100,
    },
    AchievementDefinition {
        kind: AchievementKind::TeamPlayer,
        name: "Team Player",
        description: "Join a team",
        goal: 1,
    },
];

/// All known achievements
pub fn catalog() -> &'static [AchievementDefinition] {
    &CATALOG
}

pub fn definition(kind: AchievementKind) -> &'static AchievementDefinition {
    // every kind has exactly one catalogue entry
    CATALOG
        .iter()
        .find(|def| def.kind == kind)
        .unwrap_or(&CATALOG[0])
}

/// Add `increment` to the player's progress for `kind`.
/// Returns true only when this call unlocks the achievement.
pub fn track_progress(
    player: &mut Player,
    kind: AchievementKind,
    increment: u32,
    now: DateTime<Utc>,
) -> bool {
    let goal = definition(kind).goal;
    let entry = progress_entry(player, kind);
    if entry.unlocked {
        return false;
    }
    entry.increment(increment);
    if entry.progress >= goal {
        entry.mark_unlocked(now);
        return true;
    }
    false
}

/// Re-validate every counter-backed achievement against the player's current
/// tallies and score. Returns the kinds unlocked by this call.
pub fn check_achievements(player: &mut Player, now: DateTime<Utc>) -> Vec<AchievementKind> {
    let mut unlocked = Vec::new();
    for def in catalog() {
        let Some(derived) = derived_progress(player, def.kind) else {
            continue;
        };
        let entry = progress_entry(player, def.kind);
        if entry.unlocked {
            continue;
        }
        if derived > entry.progress {
            entry.progress = derived;
        }
        if entry.progress >= def.goal {
            entry.mark_unlocked(now);
            unlocked.push(def.kind);
        }
    }
    unlocked
}

/// Definitions of everything the player has unlocked.
pub fn unlocked_achievements(player: &Player) -> Vec<&'static AchievementDefinition> {
    catalog()
        .iter()
        .filter(|def| player.has_unlocked(def.kind))
        .collect()
}

/// Current progress toward an achievement, zero if never touched.
pub fn progress_of(player: &Player, kind: AchievementKind) -> u32 {
    player.achievement(kind).map_or(0, |pa| pa.progress)
}

fn derived_progress(player: &Player, kind: AchievementKind) -> Option<u32> {
    use AchievementKind::*;

    match kind {
        FirstCow | CowHerder => Some(player.cow_count),
        ChurchGoer => Some(player.church_count),
        TowerSpotter => Some(player.water_tower_count),
        RainbowChaser => Some(player.rainbow_car_count),
        ScavengerMaster => Some(player.scavenger_items_found),
        TriviaWhiz => Some(player.trivia_correct),
        PointCollector => Some(calculate_player_score(player)),
        TeamPlayer => None,
    }
}

fn progress_entry(player: &mut Player, kind: AchievementKind) -> &mut PlayerAchievement {
    let idx = match player.achievements.iter().position(|pa| pa.kind == kind) {
        Some(idx) => idx,
        None => {
            player.achievements.push(PlayerAchievement::new(kind));
            player.achievements.len() - 1
        }
    };
    &mut player.achievements[idx]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 3, 12, 0, 0).unwrap()
    }

    #[test]
    fn catalog_has_one_entry_per_kind() {
        for def in catalog() {
            assert_eq!(definition(def.kind).kind, def.kind);
        }
    }

    #[test]
    fn track_progress_unlocks_once() {
        let mut player = Player::new("alice");
        assert!(!track_progress(&mut player, AchievementKind::TowerSpotter, 3, now()));
        assert_eq!(progress_of(&player, AchievementKind::TowerSpotter), 3);
        assert!(track_progress(&mut player, AchievementKind::TowerSpotter, 2, now()));
        // re-triggering after unlock is a no-op
        assert!(!track_progress(&mut player, AchievementKind::TowerSpotter, 2, now()));
        assert_eq!(progress_of(&player, AchievementKind::TowerSpotter), 5);
        assert!(player.has_unlocked(AchievementKind::TowerSpotter));
    }

    #[test]
    fn check_achievements_derives_from_counters() {
        let mut player = Player::new("bob");
        player.cow_count = 1;
        let unlocked = check_achievements(&mut player, now());
        assert_eq!(unlocked, vec![AchievementKind::FirstCow]);
        let entry = player
            .achievements
            .iter()
            .find(|a| a.kind == AchievementKind::FirstCow)
            .unwrap();
        assert_eq!(entry.unlocked_at, Some(now()));
        assert_eq!(progress_of(&player, AchievementKind::CowHerder), 1);

        // nothing new on a second pass
        assert!(check_achievements(&mut player, now()).is_empty());
    }

    #[test]
    fn unlock_survives_a_score_drop() {
        let mut player = Player::new("carol");
        player.base_points = 100;
        assert!(check_achievements(&mut player, now()).contains(&AchievementKind::PointCollector));

        player.base_points = 0;
        check_achievements(&mut player, now());
        assert!(player.has_unlocked(AchievementKind::PointCollector));
        assert_eq!(progress_of(&player, AchievementKind::PointCollector), 100);
    }

    #[test]
    fn progress_never_decreases() {
        let mut player = Player::new("dave");
        player.church_count = 4;
        check_achievements(&mut player, now());
        player.church_count = 1;
        check_achievements(&mut player, now());
        assert_eq!(progress_of(&player, AchievementKind::ChurchGoer), 4);
    }

    #[test]
    fn team_player_is_event_only() {
        let mut player = Player::new("erin");
        player.team = Some("Herd".to_string());
        check_achievements(&mut player, now());
        assert!(!player.has_unlocked(AchievementKind::TeamPlayer));
        assert!(track_progress(&mut player, AchievementKind::TeamPlayer, 1, now()));
        assert_eq!(
            unlocked_achievements(&player)
                .iter()
                .map(|d| d.kind)
                .collect::<Vec<_>>(),
            vec![AchievementKind::TeamPlayer]
        );
    }
}
