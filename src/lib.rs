//! # Cow Cow - road-trip spotting game engine
//!
//! Players call out cows, churches, water towers and rainbow-coloured cars
//! from the car window. This crate keeps score: base points from calls,
//! penalties and power-ups that shape the total, custom rules, achievements,
//! one optional team, and the extra Scavenger Hunt and Trivia modes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cowcow::game::{
//!     EngineSettings, GameEngine, GameMode, MemoryStore, NotificationLog, RuleBook, SystemClock,
//! };
//!
//! let mut engine = GameEngine::new(
//!     MemoryStore::new(),
//!     NotificationLog::new(),
//!     SystemClock,
//!     EngineSettings::default(),
//!     RuleBook::defaults(),
//! );
//! let alice = engine.add_player("Alice");
//! engine.start_game(GameMode::Classic, None);
//! engine.handle_call(&alice, "cow");
//! assert_eq!(engine.player_score(&alice), Some(1));
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - data model, scoring rules and the event engine
//! - [`config`] - TOML configuration
//! - [`script`] - JSON game scripts replayed against the engine

pub mod config;
pub mod game;
pub mod script;
