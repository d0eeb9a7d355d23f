//! Collaborator interfaces the engine talks to, plus in-memory versions.
//!
//! The engine's own state is authoritative during a session; stores only
//! receive copies (fire-and-forget) and seed the roster when a session opens.

use chrono::{DateTime, Duration, Utc};
use std::cell::RefCell;

use crate::game::errors::GameError;
use crate::game::types::{Player, PlayerId, Team};

pub trait PlayerStore {
    fn get_player(&self, id: &PlayerId) -> Result<Player, GameError>;
    fn update_player(&self, player: &Player) -> Result<(), GameError>;
    fn delete_player(&self, id: &PlayerId) -> Result<(), GameError>;
    /// Stored players, oldest first.
    fn list_players(&self) -> Result<Vec<Player>, GameError>;
}

pub trait TeamStore {
    fn load_team(&self) -> Result<Option<Team>, GameError>;
    fn save_team(&self, team: &Team) -> Result<(), GameError>;
}

/// Both halves of persistence in one handle.
pub trait GameStorage: PlayerStore + TeamStore {}

impl<T: PlayerStore + TeamStore> GameStorage for T {}

/// Append-only sink for human-readable game messages.
pub trait NotificationSink {
    fn notify(&mut self, message: &str);
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// Store that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    players: RefCell<Vec<Player>>,
    team: RefCell<Option<Team>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerStore for MemoryStore {
    fn get_player(&self, id: &PlayerId) -> Result<Player, GameError> {
        self.players
            .borrow()
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .ok_or_else(|| GameError::NotFound {
                entity: "player",
                key: id.to_string(),
            })
    }

    fn update_player(&self, player: &Player) -> Result<(), GameError> {
        let mut players = self.players.borrow_mut();
        match players.iter_mut().find(|p| p.id == player.id) {
            Some(slot) => *slot = player.clone(),
            None => players.push(player.clone()),
        }
        Ok(())
    }

    fn delete_player(&self, id: &PlayerId) -> Result<(), GameError> {
        self.players.borrow_mut().retain(|p| p.id != *id);
        Ok(())
    }

    fn list_players(&self) -> Result<Vec<Player>, GameError> {
        Ok(self.players.borrow().clone())
    }
}

impl TeamStore for MemoryStore {
    fn load_team(&self) -> Result<Option<Team>, GameError> {
        Ok(self.team.borrow().clone())
    }

    fn save_team(&self, team: &Team) -> Result<(), GameError> {
        *self.team.borrow_mut() = Some(team.clone());
        Ok(())
    }
}

/// Notification sink that keeps every message.
#[derive(Debug, Default, Clone)]
pub struct NotificationLog {
    messages: Vec<String>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    /// Hand over everything logged so far and start empty.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Copy)]
pub struct ManualClock {
    now: DateTime<Utc>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: start }
    }

    /// Move the clock. Saturates at the ends of the calendar.
    pub fn advance(&mut self, by: Duration) {
        self.now = self.now.checked_add_signed(by).unwrap_or(if by < Duration::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });
    }

    pub fn set(&mut self, now: DateTime<Utc>) {
        self.now = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
