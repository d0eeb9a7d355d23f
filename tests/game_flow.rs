/// Integration tests for single-player gameplay: calls, penalties, power-ups,
/// custom rules and achievements flowing through the engine pipeline.
mod common;

use chrono::Duration;
use cowcow::game::{
    AchievementKind, AppliedEffect, CalledObject, Clock, Condition, ConditionKind, CustomRule,
    Difficulty, EngineSettings, GameMode, GameState, LocationType, ObjectType, Occasion, Penalty,
    PenaltyOutcome, PenaltyType, Player, PowerUpType, RuleBook, RuleEffect, ScavengerHunt,
    ScavengerHuntItem, TriviaDeck, TriviaQuestion,
};

use common::{engine, engine_with};

#[test]
fn church_call_scores_two_points() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    assert!(e.start_game(GameMode::Classic, None));

    let outcome = e.handle_call(&alice, "Church").expect("call accepted");
    assert_eq!(outcome.points, 2);
    assert_eq!(outcome.score, 2);
    assert_eq!(outcome.team_score, None);

    let player = e.player(&alice).unwrap();
    assert_eq!(player.church_count, 1);
    assert_eq!(player.base_points, 2);
}

#[test]
fn called_object_variant_is_resolved_directly() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    e.start_game(GameMode::Classic, None);

    let outcome = e
        .handle_player_selected(&alice, CalledObject::Object(ObjectType::WaterTower))
        .unwrap();
    assert_eq!(outcome.points, 3);
    assert_eq!(e.player(&alice).unwrap().water_tower_count, 1);
}

#[test]
fn deduction_larger_than_base_floors_at_zero() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    e.start_game(GameMode::Classic, None);
    e.handle_call(&alice, "red car");
    e.handle_call(&alice, "blue car");
    assert_eq!(e.player_score(&alice), Some(10));

    let now = e.clock().now();
    let outcome =
        e.apply_penalty_to_player(&alice, Penalty::new(PenaltyType::PointDeduction, 15, now));
    assert_eq!(outcome, Some(PenaltyOutcome::Applied));
    assert_eq!(e.player_score(&alice), Some(0));
    // base points are untouched; the deduction applies at read time
    assert_eq!(e.player(&alice).unwrap().base_points, 10);
}

#[test]
fn bonus_does_not_lift_a_deficit_above_zero() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    e.start_game(GameMode::Classic, None);
    e.handle_call(&alice, "red car");
    e.handle_call(&alice, "blue car");

    let now = e.clock().now();
    e.apply_penalty_to_player(&alice, Penalty::new(PenaltyType::PointDeduction, 15, now));
    e.activate_power_up_for_player(&alice, PowerUpType::BonusPoints, 60_000, 5.0);
    // 10 - 15 + 5
    assert_eq!(e.player_score(&alice), Some(0));

    e.activate_power_up_for_player(&alice, PowerUpType::DoublePoints, 60_000, 2.0);
    // (10 - 15) * 2 + 5
    assert_eq!(e.player_score(&alice), Some(0));

    let outcome = e.handle_call(&alice, "church").unwrap();
    // (12 - 15) * 2 + 5
    assert_eq!(outcome.score, 0);
    let outcome = e.handle_call(&alice, "water tower").unwrap();
    // (15 - 15) * 2 + 5
    assert_eq!(outcome.score, 5);
}

#[test]
fn double_points_doubles_the_total() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    e.start_game(GameMode::Classic, None);
    e.activate_power_up_for_player(&alice, PowerUpType::DoublePoints, 60_000, 2.0);

    let outcome = e.handle_call(&alice, "green car").unwrap();
    assert_eq!(outcome.points, 5);
    assert_eq!(outcome.score, 10);
}

#[test]
fn unknown_call_is_ignored() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    e.start_game(GameMode::Classic, None);

    assert!(e.handle_call(&alice, "giraffe").is_none());
    assert_eq!(e.player_score(&alice), Some(0));
    assert!(e.notifier().last().unwrap().contains("giraffe"));
}

#[test]
fn silence_outlives_its_duration_until_the_next_event() {
    let mut e = engine();
    let bob = e.add_player("Bob");
    e.start_game(GameMode::Classic, None);
    let now = e.clock().now();
    e.apply_penalty_to_player(
        &bob,
        Penalty::new(PenaltyType::Silenced, 0, now).with_duration_ms(30_000),
    );

    assert!(e.handle_call(&bob, "cow").is_none());
    assert!(e.notifier().last().unwrap().contains("silenced"));

    e.clock_mut().advance(Duration::seconds(31));
    // expired on the clock, but the flag is only lowered by cleanup,
    // which runs after this rejected call is judged
    assert!(e.player(&bob).unwrap().silenced);
    assert!(e.handle_call(&bob, "cow").is_none());
    assert!(!e.player(&bob).unwrap().silenced);

    assert!(e.handle_call(&bob, "cow").is_some());
    assert_eq!(e.player_score(&bob), Some(1));
}

#[test]
fn expired_power_up_counts_until_cleanup() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    e.start_game(GameMode::Classic, None);
    e.activate_power_up_for_player(&alice, PowerUpType::DoublePoints, 10_000, 2.0);
    e.handle_call(&alice, "cow");
    assert_eq!(e.player_score(&alice), Some(2));

    e.clock_mut().advance(Duration::seconds(20));
    assert_eq!(e.player_score(&alice), Some(2));

    let outcome = e.handle_call(&alice, "cow").unwrap();
    assert_eq!(outcome.expired_power_ups.len(), 1);
    assert_eq!(outcome.score, 2);
}

#[test]
fn refreshing_a_power_up_keeps_one_instance() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    e.start_game(GameMode::Classic, None);
    e.activate_power_up_for_player(&alice, PowerUpType::ScoreMultiplier, 10_000, 1.5);
    e.clock_mut().advance(Duration::seconds(8));
    e.activate_power_up_for_player(&alice, PowerUpType::ScoreMultiplier, 10_000, 50.0);

    let player = e.player(&alice).unwrap();
    assert_eq!(player.power_ups.len(), 1);
    assert_eq!(player.power_ups[0].effect_value, 5.0);

    // the refresh restarted the timer, so 8 more seconds is still inside it
    e.clock_mut().advance(Duration::seconds(8));
    let outcome = e.handle_call(&alice, "cow").unwrap();
    assert!(outcome.expired_power_ups.is_empty());
    assert_eq!(outcome.score, 5);
}

#[test]
fn immunity_blocks_and_shield_absorbs() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    let bob = e.add_player("Bob");
    e.start_game(GameMode::Classic, None);
    e.activate_power_up_for_player(&alice, PowerUpType::Immunity, 60_000, 1.0);
    e.activate_power_up_for_player(&bob, PowerUpType::Shield, 60_000, 1.0);

    let now = e.clock().now();
    let silence = Penalty::new(PenaltyType::Silenced, 0, now).with_duration_ms(30_000);
    assert_eq!(
        e.apply_penalty_to_player(&alice, silence.clone()),
        Some(PenaltyOutcome::Blocked)
    );
    assert_eq!(
        e.apply_penalty_to_player(&bob, silence.clone()),
        Some(PenaltyOutcome::Absorbed)
    );
    assert_eq!(
        e.apply_penalty_to_player(&bob, silence),
        Some(PenaltyOutcome::Applied)
    );
    assert!(e.handle_call(&alice, "cow").is_some());
    assert!(e.handle_call(&bob, "cow").is_none());
}

#[test]
fn rule_points_land_after_the_achievement_pass() {
    let mut e = engine();
    let mut veteran = Player::new("Vera");
    veteran.base_points = 95;
    let vera = veteran.id;
    assert!(e.add_existing_player(veteran));
    e.start_game(GameMode::Classic, None);
    e.assign_custom_rule(
        &vera,
        CustomRule::new("Boost", RuleEffect::AddPoints, 10).with_condition(Condition::always()),
    );

    let outcome = e.handle_call(&vera, "cow").unwrap();
    assert_eq!(outcome.unlocked, vec![AchievementKind::FirstCow]);
    assert_eq!(
        outcome.rule,
        Some(("Boost".to_string(), AppliedEffect::PointsAdded(10)))
    );
    assert_eq!(outcome.score, 106);
    assert!(e.player(&vera).unwrap().custom_rule.is_none());

    let outcome = e.handle_call(&vera, "cow").unwrap();
    assert_eq!(outcome.unlocked, vec![AchievementKind::PointCollector]);
    assert_eq!(outcome.rule, None);
}

#[test]
fn pending_rule_waits_for_its_conditions() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    e.start_game(GameMode::Classic, None);
    e.assign_custom_rule(
        &alice,
        CustomRule::new("Leader tax", RuleEffect::DeductPoints, 2).with_condition(Condition::new(
            ConditionKind::ScoreAbove { threshold: 4 },
            "leading",
        )),
    );

    let first = e.handle_call(&alice, "water tower").unwrap();
    assert_eq!(first.rule, None);
    assert!(e.player(&alice).unwrap().custom_rule.is_some());

    let second = e.handle_call(&alice, "church").unwrap();
    assert_eq!(
        second.rule,
        Some(("Leader tax".to_string(), AppliedEffect::PointsDeducted(2)))
    );
    assert_eq!(second.score, 3);
}

#[test]
fn duplicate_player_is_a_state_conflict() {
    let mut e = engine();
    let player = Player::new("Alice");
    assert!(e.add_existing_player(player.clone()));
    assert!(!e.add_existing_player(player));
    assert_eq!(e.players().len(), 1);
}

#[test]
fn halloween_start_grants_a_shield() {
    let settings = EngineSettings {
        occasion: Some(Occasion::Halloween),
        ..EngineSettings::default()
    };
    let mut e = engine_with(settings, RuleBook::defaults());
    let alice = e.add_player("Alice");
    e.start_game(GameMode::Classic, None);

    let player = e.player(&alice).unwrap();
    assert_eq!(player.power_ups.len(), 1);
    assert_eq!(player.power_ups[0].kind, PowerUpType::Shield);

    let now = e.clock().now();
    assert_eq!(
        e.apply_penalty_to_player(&alice, Penalty::new(PenaltyType::FalseCall, 1, now)),
        Some(PenaltyOutcome::Absorbed)
    );
}

#[test]
fn scavenger_hunt_claims_once_per_item() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    let bob = e.add_player("Bob");
    e.set_scavenger_hunt(ScavengerHunt::new(vec![
        ScavengerHuntItem::new("Tractor", Difficulty::Easy, LocationType::Rural),
        ScavengerHuntItem::new("Clock Tower", Difficulty::Hard, LocationType::Town),
    ]));
    e.start_game(GameMode::ScavengerHunt, None);
    assert_eq!(e.scavenger_hunt().items.len(), 2);

    let found = e.handle_call(&alice, "tractor").unwrap();
    assert_eq!(found.points, 2);
    assert!(e.handle_call(&bob, "Tractor").is_none());

    let last = e.handle_scavenger_hunt_item_found(&bob, "clock tower").unwrap();
    assert_eq!(last.points, 6);
    assert!(last.message.contains("complete"));
    assert!(e.scavenger_hunt().is_complete());
    assert_eq!(e.player(&bob).unwrap().scavenger_items_found, 1);
}

#[test]
fn scavenger_mode_draws_a_hunt_when_none_is_set() {
    let mut e = engine();
    e.start_game(GameMode::ScavengerHunt, None);
    assert_eq!(e.scavenger_hunt().items.len(), 10);
}

#[test]
fn trivia_scores_correct_answers_and_moves_on() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    let question = |prompt: &str, answer: &str| TriviaQuestion {
        prompt: prompt.to_string(),
        choices: vec!["Foal".into(), "Calf".into(), "Kid".into()],
        answer: answer.to_string(),
        points: 3,
    };
    e.set_trivia_deck(TriviaDeck::in_order(vec![
        question("Baby cow?", "Calf"),
        question("Baby horse?", "Foal"),
    ]));
    e.start_game(GameMode::Trivia, None);

    let wrong = e.handle_trivia_question_answer(&alice, "Kid").unwrap();
    assert_eq!(wrong.points, 0);
    assert_eq!(e.trivia().current().unwrap().prompt, "Baby cow?");

    let right = e.handle_trivia_question_answer(&alice, "b").unwrap();
    assert_eq!(right.points, 3);
    assert_eq!(e.trivia().current().unwrap().prompt, "Baby horse?");
    assert_eq!(e.player(&alice).unwrap().trivia_correct, 1);
}

#[test]
fn stop_announces_the_winner_and_reset_starts_over() {
    let mut e = engine();
    let alice = e.add_player("Alice");
    let bob = e.add_player("Bob");
    e.start_game(GameMode::Classic, Some(20 * 60_000));
    for _ in 0..3 {
        e.handle_call(&alice, "cow");
    }
    e.handle_call(&bob, "church");

    assert!(e.stop_game());
    assert_eq!(e.state(), GameState::Completed);
    assert!(e.notifier().last().unwrap().contains("Winner: Alice"));

    e.reset_game();
    assert_eq!(e.state(), GameState::NotStarted);
    let player = e.player(&alice).unwrap();
    assert_eq!(player.base_points, 0);
    assert_eq!(player.cow_count, 0);
    assert!(player.has_unlocked(AchievementKind::FirstCow));
}
