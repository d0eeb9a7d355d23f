//! Test utilities & fixtures.
//! Engines wired to in-memory collaborators and a clock parked at a fixed,
//! non-holiday instant so date-driven rules stay quiet.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use cowcow::game::{
    EngineSettings, GameEngine, ManualClock, MemoryStore, NotificationLog, RuleBook,
};

pub type TestEngine = GameEngine<MemoryStore, NotificationLog, ManualClock>;

/// 2026-06-03 12:00 UTC, a plain Wednesday.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 3, 12, 0, 0).unwrap()
}

/// Engine with no built-in rules and a seeded RNG.
pub fn engine() -> TestEngine {
    engine_with(EngineSettings::default(), RuleBook::empty())
}

pub fn engine_with(settings: EngineSettings, rules: RuleBook) -> TestEngine {
    GameEngine::new(
        MemoryStore::new(),
        NotificationLog::new(),
        ManualClock::new(start_time()),
        settings,
        rules,
    )
    .with_rng_seed(11)
}

/// Directory holding the static JSON scripts.
#[allow(dead_code)] // only the script tests read fixtures
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test-data-int")
}
