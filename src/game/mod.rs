//! Cow Cow game state and scoring.
//!
//! Pure game rules live in the leaf modules (scoring, conditions, penalties,
//! power-ups, custom rules, achievements). `engine` strings them together
//! per event, and `storage` keeps players and the team in sled between runs.

pub mod achievement;
pub mod condition;
pub mod custom_rule;
pub mod engine;
pub mod errors;
pub mod occasion;
pub mod penalty;
pub mod ports;
pub mod power_up;
pub mod rules;
pub mod scavenger;
pub mod score;
pub mod storage;
pub mod trivia;
pub mod types;

pub use achievement::{
    catalog, check_achievements, definition, progress_of, track_progress, unlocked_achievements,
    AchievementDefinition,
};
pub use condition::{evaluate, evaluate_all, EvalContext};
pub use custom_rule::{
    apply_custom_rule, apply_custom_rules_for_game, apply_rule_effect, rule_triggers,
    AppliedEffect, RuleEnv, RuleOutcome,
};
pub use engine::{EngineSettings, EventOutcome, GameEngine, GameSession, TeamState};
pub use errors::GameError;
pub use occasion::Occasion;
pub use penalty::{apply_penalty, clear_player_penalties, remove_expired_penalties, PenaltyOutcome};
pub use ports::{
    Clock, GameStorage, ManualClock, MemoryStore, NotificationLog, NotificationSink, PlayerStore,
    SystemClock, TeamStore,
};
pub use power_up::{
    activate_power_up, check_for_expired_power_ups, clear_active_power_ups, has_active, Activation,
    DEFAULT_MAX_MULTIPLIER,
};
pub use rules::{ModeRule, RuleBook};
pub use scavenger::{catalog_items, FindResult, ScavengerHunt};
pub use score::{
    apply_points, award_object, calculate_player_score, calculate_total_team_score, leaderboard,
    points_for_call, score_multiplier, validate_call,
};
pub use storage::{GameStore, GameStoreBuilder};
pub use trivia::{check_answer, question_bank, TriviaDeck, DEFAULT_TRIVIA_POINTS};
pub use types::*;
