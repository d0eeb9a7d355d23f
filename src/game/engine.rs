//! Game event orchestration.
//!
//! `GameEngine` owns the roster, the single team, the session lifecycle and
//! the per-mode extras (scavenger hunt, trivia deck). Every gameplay event
//! runs to completion through the same pipeline:
//!
//! 1. score change to base points
//! 2. player update handed to the store
//! 3. team score recomputed when the player is on the team
//! 4. the player's pending custom rule is evaluated
//! 5. achievements are re-checked
//! 6. the pending rule fires if step 4 said so
//! 7. expired penalties and power-ups are dropped
//! 8. a notification is emitted
//!
//! The order matters. Achievements see the post-score state, and a rule's
//! point change lands after the achievement pass, so it cannot count toward
//! an unlock in the same tick. Expiry is lazy: an expired effect stays on a
//! player until the next event touching that player reaches step 7.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::achievement::{check_achievements, definition, track_progress};
use crate::game::custom_rule::{
    apply_custom_rules_for_game, apply_rule_effect, rule_triggers, AppliedEffect, RuleEnv,
};
use crate::game::occasion::Occasion;
use crate::game::penalty::{
    apply_penalty, clear_player_penalties, remove_expired_penalties, PenaltyOutcome,
};
use crate::game::power_up::{
    activate_power_up, check_for_expired_power_ups, clear_active_power_ups, Activation,
    DEFAULT_MAX_MULTIPLIER,
};
use crate::game::ports::{Clock, GameStorage, NotificationSink};
use crate::game::rules::RuleBook;
use crate::game::scavenger::{FindResult, ScavengerHunt};
use crate::game::score::{
    award_object, calculate_player_score, calculate_total_team_score, leaderboard,
};
use crate::game::trivia::{check_answer, question_bank, TriviaDeck};
use crate::game::types::{
    AchievementKind, CalledObject, CustomRule, GameMode, GameState, ObjectType, Penalty, Player,
    PlayerId, PowerUp, PowerUpType, Team,
};

/// Knobs the engine reads from configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub team_name: String,
    pub max_multiplier: f64,
    /// Overrides the per-question trivia points when set
    pub trivia_points: Option<u32>,
    pub scavenger_items: usize,
    /// Pins the occasion instead of deriving it from the date
    pub occasion: Option<Occasion>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            team_name: "Team Moo".to_string(),
            max_multiplier: DEFAULT_MAX_MULTIPLIER,
            trivia_points: None,
            scavenger_items: 10,
            occasion: None,
        }
    }
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSession {
    pub state: GameState,
    pub mode: GameMode,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    paused_at: Option<DateTime<Utc>>,
    paused_ms: i64,
}

impl GameSession {
    /// Play time so far, not counting pauses.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let Some(started) = self.started_at else {
            return Duration::zero();
        };
        let mut paused = Duration::try_milliseconds(self.paused_ms).unwrap_or(Duration::zero());
        if let Some(at) = self.paused_at {
            paused = paused.checked_add(&(now - at)).unwrap_or(Duration::MAX);
        }
        (now - started)
            .checked_sub(&paused)
            .unwrap_or(Duration::zero())
            .max(Duration::zero())
    }

    /// `None` for untimed games. A duration too large to represent never
    /// runs out.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let ms = self.duration_ms?;
        let total = Duration::try_milliseconds(ms).unwrap_or(Duration::MAX);
        let left = total
            .checked_sub(&self.elapsed(now))
            .unwrap_or(Duration::zero());
        Some(left.max(Duration::zero()))
    }

    fn time_is_up(&self, now: DateTime<Utc>) -> bool {
        self.state == GameState::InProgress
            && matches!(self.remaining(now), Some(left) if left <= Duration::zero())
    }
}

// ============================================================================
// Team
// ============================================================================

/// The one team of the session. All membership changes go through here.
#[derive(Debug, Clone)]
pub struct TeamState {
    team: Team,
}

impl TeamState {
    pub fn new(team: Team) -> Self {
        Self { team }
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    /// Add the player. Fails if already a member or on another team.
    pub fn join(&mut self, player: &mut Player) -> bool {
        if player.team.is_some() || self.team.contains(&player.id) {
            return false;
        }
        self.team.members.push(player.id);
        player.team = Some(self.team.name.clone());
        true
    }

    /// Remove the player. Fails if not a member.
    pub fn leave(&mut self, player: &mut Player) -> bool {
        if !self.team.contains(&player.id) {
            return false;
        }
        self.team.members.retain(|id| *id != player.id);
        player.team = None;
        true
    }

    pub fn score(&self, players: &[Player]) -> u32 {
        calculate_total_team_score(&self.team, players)
    }

    fn forget(&mut self, id: &PlayerId) {
        self.team.members.retain(|member| member != id);
    }
}

// ============================================================================
// Event results
// ============================================================================

/// Everything that happened while handling one event
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    pub player: PlayerId,
    /// Base points credited by the event itself
    pub points: u32,
    /// Player's total after the event
    pub score: u32,
    /// Team total as of step 3, when the player is on the team
    pub team_score: Option<u32>,
    pub unlocked: Vec<AchievementKind>,
    /// Effect of the pending custom rule, if it fired
    pub rule: Option<(String, AppliedEffect)>,
    pub expired_penalties: Vec<Penalty>,
    pub expired_power_ups: Vec<PowerUp>,
    pub message: String,
}

// ============================================================================
// Engine
// ============================================================================

pub struct GameEngine<S, N, C> {
    store: S,
    notifier: N,
    clock: C,
    settings: EngineSettings,
    rules: RuleBook,
    players: Vec<Player>,
    team: TeamState,
    session: GameSession,
    hunt: ScavengerHunt,
    trivia: TriviaDeck,
    rng: StdRng,
}

impl<S, N, C> GameEngine<S, N, C>
where
    S: GameStorage,
    N: NotificationSink,
    C: Clock,
{
    /// Build an engine, seeding the roster and team from the store.
    pub fn new(store: S, notifier: N, clock: C, settings: EngineSettings, rules: RuleBook) -> Self {
        let players = match store.list_players() {
            Ok(players) => players,
            Err(e) => {
                warn!("Could not load players, starting with an empty roster: {}", e);
                Vec::new()
            }
        };
        let team = match store.load_team() {
            Ok(Some(team)) => team,
            Ok(None) => Team::new(&settings.team_name),
            Err(e) => {
                warn!("Could not load team, starting a fresh one: {}", e);
                Team::new(&settings.team_name)
            }
        };

        let mut engine = Self {
            store,
            notifier,
            clock,
            settings,
            rules,
            players,
            team: TeamState::new(team),
            session: GameSession::default(),
            hunt: ScavengerHunt::default(),
            trivia: TriviaDeck::default(),
            rng: StdRng::from_entropy(),
        };
        engine.reconcile_team();
        info!(
            "Engine ready: {} players, team '{}' with {} members",
            engine.players.len(),
            engine.team.team().name,
            engine.team.team().members.len()
        );
        engine
    }

    /// Make random draws (hunt lists, trivia order) reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    pub fn player_score(&self, id: &PlayerId) -> Option<u32> {
        self.player(id).map(calculate_player_score)
    }

    pub fn team(&self) -> &Team {
        self.team.team()
    }

    pub fn team_score(&self) -> u32 {
        self.team.score(&self.players)
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn state(&self) -> GameState {
        self.session.state
    }

    pub fn scavenger_hunt(&self) -> &ScavengerHunt {
        &self.hunt
    }

    pub fn trivia(&self) -> &TriviaDeck {
        &self.trivia
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn leaderboard(&self) -> Vec<(&Player, u32)> {
        leaderboard(&self.players)
    }

    /// Occasion in effect at `now`.
    pub fn current_occasion(&self, now: DateTime<Utc>) -> Option<Occasion> {
        self.settings
            .occasion
            .or_else(|| Occasion::for_date(now.date_naive()))
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    pub fn add_player(&mut self, name: &str) -> PlayerId {
        let player = Player::new(name);
        let id = player.id;
        self.players.push(player);
        self.persist(self.players.len() - 1);
        self.notify(&format!("{} joined the game", name));
        id
    }

    /// Add an existing player record. Fails when the id is already present.
    pub fn add_existing_player(&mut self, mut player: Player) -> bool {
        if self.player(&player.id).is_some() {
            return false;
        }
        if player.team.is_some() && !self.team.team().contains(&player.id) {
            player.team = None;
        }
        self.players.push(player);
        self.persist(self.players.len() - 1);
        true
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> bool {
        let Some(idx) = self.index_of(id) else {
            warn!("remove_player: no player {}", id);
            return false;
        };
        let player = self.players.remove(idx);
        if self.team.team().contains(id) {
            self.team.forget(id);
            self.save_team();
        }
        if let Err(e) = self.store.delete_player(id) {
            warn!("Failed to delete player {}: {}", player.name, e);
        }
        self.notify(&format!("{} left the game", player.name));
        true
    }

    /// Attach a rule that fires on the player's next event whose conditions hold.
    pub fn assign_custom_rule(&mut self, id: &PlayerId, rule: CustomRule) -> bool {
        let Some(idx) = self.index_of(id) else {
            warn!("assign_custom_rule: no player {}", id);
            return false;
        };
        debug!("Assigning rule '{}' to {}", rule.name, self.players[idx].name);
        self.players[idx].custom_rule = Some(rule);
        self.persist(idx);
        true
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start a game. Only a fresh (not started) session can start.
    pub fn start_game(&mut self, mode: GameMode, duration_ms: Option<i64>) -> bool {
        if self.session.state != GameState::NotStarted {
            warn!("start_game ignored: session is {:?}", self.session.state);
            return false;
        }
        let now = self.clock.now();
        self.session = GameSession {
            state: GameState::InProgress,
            mode,
            started_at: Some(now),
            duration_ms: duration_ms.filter(|ms| *ms > 0),
            paused_at: None,
            paused_ms: 0,
        };

        match mode {
            GameMode::ScavengerHunt => {
                if self.hunt.items.is_empty() {
                    self.hunt =
                        ScavengerHunt::generate(&mut self.rng, self.settings.scavenger_items, None);
                }
            }
            GameMode::Trivia => {
                if self.trivia.current().is_none() {
                    self.trivia = TriviaDeck::shuffled(&mut self.rng, question_bank());
                }
            }
            GameMode::Classic | GameMode::Teams => {}
        }

        let env = RuleEnv {
            team: Some(self.team.team()),
            now,
            occasion: self.current_occasion(now),
            max_multiplier: self.settings.max_multiplier,
        };
        let results = apply_custom_rules_for_game(&mut self.players, mode, &self.rules, &env);
        for (id, rule, outcome) in &results {
            if outcome.fired() {
                debug!("Start rule '{}' fired for {}", rule, id);
            }
        }
        for idx in 0..self.players.len() {
            self.persist(idx);
        }

        let length = match self.session.duration_ms {
            Some(ms) => format!(" for {} min", ms / 60_000),
            None => String::new(),
        };
        info!("{} game started{}", mode, length);
        self.notify(&format!("{} game started{}!", mode, length));
        true
    }

    pub fn pause_game(&mut self) -> bool {
        let now = self.clock.now();
        self.expire_session(now);
        if self.session.state != GameState::InProgress {
            return false;
        }
        self.session.state = GameState::Paused;
        self.session.paused_at = Some(now);
        self.notify("Game paused");
        true
    }

    pub fn resume_game(&mut self) -> bool {
        if self.session.state != GameState::Paused {
            return false;
        }
        let now = self.clock.now();
        if let Some(at) = self.session.paused_at.take() {
            self.session.paused_ms = self
                .session
                .paused_ms
                .saturating_add((now - at).num_milliseconds().max(0));
        }
        self.session.state = GameState::InProgress;
        self.notify("Game resumed");
        true
    }

    /// End the game. Completed is terminal until `reset_game`.
    pub fn stop_game(&mut self) -> bool {
        let now = self.clock.now();
        self.expire_session(now);
        match self.session.state {
            GameState::InProgress | GameState::Paused => {
                self.complete("Game over!");
                true
            }
            GameState::NotStarted | GameState::Completed => false,
        }
    }

    /// Fresh session: scores, counters, penalties and power-ups are cleared.
    /// Identities, team membership and achievements are kept.
    pub fn reset_game(&mut self) {
        self.session = GameSession::default();
        self.hunt = ScavengerHunt::default();
        self.trivia = TriviaDeck::default();
        for idx in 0..self.players.len() {
            let player = &mut self.players[idx];
            player.reset_progress();
            clear_player_penalties(player);
            clear_active_power_ups(player);
            self.persist(idx);
        }
        info!("Game reset");
        self.notify("Game reset. Scores are back to zero.");
    }

    /// Replace the scavenger hunt list (custom hunts, tests).
    pub fn set_scavenger_hunt(&mut self, hunt: ScavengerHunt) {
        self.hunt = hunt;
    }

    /// Replace the trivia deck (custom questions, tests).
    pub fn set_trivia_deck(&mut self, deck: TriviaDeck) {
        self.trivia = deck;
    }

    // ------------------------------------------------------------------
    // Gameplay events
    // ------------------------------------------------------------------

    /// Resolve a raw call at the boundary: road objects first, then items
    /// on the current scavenger hunt.
    pub fn handle_call(&mut self, id: &PlayerId, call: &str) -> Option<EventOutcome> {
        let called = match ObjectType::parse(call) {
            Some(object) => CalledObject::Object(object),
            None if self.hunt.get(call).is_some() => {
                CalledObject::ScavengerItem(call.trim().to_string())
            }
            None => {
                warn!("Unknown call '{}' ignored", call);
                self.notify(&format!("'{}' isn't something you can call", call.trim()));
                return None;
            }
        };
        self.handle_player_selected(id, called)
    }

    /// A player claims to have spotted something.
    pub fn handle_player_selected(
        &mut self,
        id: &PlayerId,
        called: CalledObject,
    ) -> Option<EventOutcome> {
        match called {
            CalledObject::ScavengerItem(name) => self.handle_scavenger_hunt_item_found(id, &name),
            CalledObject::Object(object) => {
                let now = self.clock.now();
                let idx = self.begin_event(id, now)?;
                let points = award_object(&mut self.players[idx], object);
                let headline =
                    format!("{} spotted a {}! +{}", self.players[idx].name, object, points);
                Some(self.finish_event(idx, now, points, headline))
            }
        }
    }

    pub fn handle_scavenger_hunt_item_found(
        &mut self,
        id: &PlayerId,
        item: &str,
    ) -> Option<EventOutcome> {
        let now = self.clock.now();
        let idx = self.begin_event(id, now)?;
        let finder = self.players[idx].id;

        let points = match self.hunt.mark_found(item, finder) {
            FindResult::Found { points } => points,
            FindResult::AlreadyFound => {
                self.notify(&format!("{} was already found", item.trim()));
                return None;
            }
            FindResult::Unknown => {
                warn!("'{}' is not on the scavenger hunt", item);
                self.notify(&format!("{} is not on the list", item.trim()));
                return None;
            }
        };

        let player = &mut self.players[idx];
        player.scavenger_items_found += 1;
        player.base_points = player.base_points.saturating_add(points);
        let mut headline = format!("{} found the {}! +{}", player.name, item.trim(), points);
        if self.hunt.is_complete() {
            headline.push_str(". Scavenger hunt complete!");
        }
        Some(self.finish_event(idx, now, points, headline))
    }

    /// Answer the face-up trivia question. Correct answers score and turn
    /// over the next question; wrong answers score nothing.
    pub fn handle_trivia_question_answer(
        &mut self,
        id: &PlayerId,
        answer: &str,
    ) -> Option<EventOutcome> {
        let now = self.clock.now();
        let Some(question) = self.trivia.current().cloned() else {
            self.notify("There is no trivia question right now");
            return None;
        };
        let idx = self.begin_event(id, now)?;

        let (points, headline) = if check_answer(&question, answer) {
            let points = self.settings.trivia_points.unwrap_or(question.points);
            let player = &mut self.players[idx];
            player.trivia_correct += 1;
            player.base_points = player.base_points.saturating_add(points);
            self.trivia.advance();
            (points, format!("{} got it right: {}! +{}", player.name, question.answer, points))
        } else {
            let name = &self.players[idx].name;
            (0, format!("{} answered '{}'. Not quite!", name, answer.trim()))
        };
        Some(self.finish_event(idx, now, points, headline))
    }

    /// Flip team membership. Returns the new membership state.
    ///
    /// Toggling twice restores membership and the team score. TeamPlayer
    /// progress recorded on the join is kept, since achievements are
    /// one-way.
    pub fn toggle_player_team_status(&mut self, id: &PlayerId) -> Option<bool> {
        let Some(idx) = self.index_of(id) else {
            warn!("toggle_player_team_status: no player {}", id);
            return None;
        };
        let now = self.clock.now();

        let player = &mut self.players[idx];
        let joined = if self.team.team().contains(&player.id) {
            self.team.leave(player);
            false
        } else {
            if !self.team.join(player) {
                warn!("{} could not join '{}'", player.name, self.team.team().name);
                return Some(player.is_on_team());
            }
            track_progress(player, AchievementKind::TeamPlayer, 1, now);
            true
        };

        self.persist(idx);
        self.save_team();
        let name = self.players[idx].name.clone();
        let team_name = self.team.team().name.clone();
        let verb = if joined { "joined" } else { "left" };
        self.notify(&format!(
            "{} {} {} (team score {})",
            name,
            verb,
            team_name,
            self.team_score()
        ));
        Some(joined)
    }

    pub fn apply_penalty_to_player(
        &mut self,
        id: &PlayerId,
        penalty: Penalty,
    ) -> Option<PenaltyOutcome> {
        let now = self.clock.now();
        let Some(idx) = self.index_of(id) else {
            warn!("apply_penalty_to_player: no player {}", id);
            return None;
        };
        let kind = penalty.kind;
        let outcome = apply_penalty(&mut self.players[idx], penalty);
        let name = &self.players[idx].name;
        let headline = match outcome {
            PenaltyOutcome::Applied => format!("{} received a {:?} penalty", name, kind),
            PenaltyOutcome::Blocked => format!("{} is immune! {:?} penalty blocked", name, kind),
            PenaltyOutcome::Absorbed => format!("{}'s shield absorbed a {:?} penalty", name, kind),
        };
        self.finish_event(idx, now, 0, headline);
        Some(outcome)
    }

    pub fn activate_power_up_for_player(
        &mut self,
        id: &PlayerId,
        kind: PowerUpType,
        duration_ms: i64,
        effect_value: f64,
    ) -> Option<Activation> {
        let now = self.clock.now();
        let Some(idx) = self.index_of(id) else {
            warn!("activate_power_up_for_player: no player {}", id);
            return None;
        };
        let activation = activate_power_up(
            &mut self.players[idx],
            kind,
            duration_ms,
            effect_value,
            now,
            self.settings.max_multiplier,
        );
        let name = &self.players[idx].name;
        let headline = match activation {
            Activation::Activated => format!("{} activated {}", name, kind),
            Activation::Refreshed => format!("{} refreshed {}", name, kind),
        };
        self.finish_event(idx, now, 0, headline);
        Some(activation)
    }

    // ------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------

    /// Gate shared by scoring events. Returns the roster index when the
    /// event may proceed.
    fn begin_event(&mut self, id: &PlayerId, now: DateTime<Utc>) -> Option<usize> {
        self.expire_session(now);
        if self.session.state != GameState::InProgress {
            debug!("Event for {} ignored: session is {:?}", id, self.session.state);
            self.notify("No game in progress");
            return None;
        }
        let Some(idx) = self.index_of(id) else {
            warn!("Event for unknown player {}", id);
            return None;
        };

        if !self.players[idx].can_act() {
            // the flag is still consulted before cleanup, so a just-expired
            // silence costs this one call
            let player = &mut self.players[idx];
            let reason = if player.banned { "banned" } else { "silenced" };
            let message = format!("{} is {} and can't call right now", player.name, reason);
            remove_expired_penalties(player, now);
            check_for_expired_power_ups(player, now);
            self.persist(idx);
            self.notify(&message);
            return None;
        }
        Some(idx)
    }

    /// Steps 2 through 8 for a player whose base points already changed.
    fn finish_event(
        &mut self,
        idx: usize,
        now: DateTime<Utc>,
        points: u32,
        headline: String,
    ) -> EventOutcome {
        // 2
        self.persist(idx);

        // 3
        let team_score = if self.players[idx].is_on_team() {
            Some(self.team.score(&self.players))
        } else {
            None
        };

        // 4
        let env = RuleEnv {
            team: Some(self.team.team()),
            now,
            occasion: self.current_occasion(now),
            max_multiplier: self.settings.max_multiplier,
        };
        let player = &self.players[idx];
        let rule_holds = player
            .custom_rule
            .as_ref()
            .is_some_and(|rule| rule_triggers(rule, player, &env));

        // 5
        let player = &mut self.players[idx];
        let unlocked = check_achievements(player, now);

        // 6
        let rule = if rule_holds {
            player.custom_rule.take().map(|rule| {
                let effect = apply_rule_effect(player, &rule, now, self.settings.max_multiplier);
                (rule.name, effect)
            })
        } else {
            None
        };

        // 7
        let expired_penalties = remove_expired_penalties(player, now);
        let expired_power_ups = check_for_expired_power_ups(player, now);

        // 8
        let score = calculate_player_score(player);
        let mut message = headline;
        for kind in &unlocked {
            message.push_str(&format!(" | Achievement unlocked: {}", definition(*kind).name));
        }
        if let Some((name, effect)) = &rule {
            message.push_str(&format!(" | Rule '{}': {}", name, describe_effect(effect)));
        }
        for power_up in &expired_power_ups {
            message.push_str(&format!(" | {} wore off", power_up.kind));
        }
        if !expired_penalties.is_empty() {
            message.push_str(&format!(" | {} penalty(s) expired", expired_penalties.len()));
        }
        message.push_str(&format!(" | Score: {}", score));

        let outcome = EventOutcome {
            player: player.id,
            points,
            score,
            team_score,
            unlocked,
            rule,
            expired_penalties,
            expired_power_ups,
            message,
        };
        self.persist(idx);
        debug!("{}", outcome.message);
        self.notify(&outcome.message);
        outcome
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn index_of(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == *id)
    }

    fn notify(&mut self, message: &str) {
        self.notifier.notify(message);
    }

    /// Hand the player to the store; failures are logged, never fatal.
    fn persist(&self, idx: usize) {
        let player = &self.players[idx];
        if let Err(e) = self.store.update_player(player) {
            warn!("Failed to save player {}: {}", player.name, e);
        }
    }

    fn save_team(&self) {
        if let Err(e) = self.store.save_team(self.team.team()) {
            warn!("Failed to save team '{}': {}", self.team.team().name, e);
        }
    }

    /// Lazily end a timed game whose clock ran out.
    fn expire_session(&mut self, now: DateTime<Utc>) {
        if self.session.time_is_up(now) {
            self.complete("Time's up!");
        }
    }

    fn complete(&mut self, headline: &str) {
        self.session.state = GameState::Completed;
        self.session.paused_at = None;
        let summary = match leaderboard(&self.players).first() {
            Some((winner, score)) => {
                format!("{} Winner: {} with {} points", headline, winner.name, score)
            }
            None => headline.to_string(),
        };
        let summary = if self.team.team().members.is_empty() {
            summary
        } else {
            format!("{} | {}: {}", summary, self.team.team().name, self.team_score())
        };
        info!("{}", summary);
        self.notify(&summary);
    }

    /// Drop stale ids and membership flags so the team and roster agree.
    fn reconcile_team(&mut self) {
        let roster: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        let before = self.team.team().members.len();
        self.team.team.members.retain(|id| roster.contains(id));
        if self.team.team().members.len() != before {
            warn!("Dropped {} unknown team member(s)", before - self.team.team().members.len());
        }
        let team = self.team.team().clone();
        for player in &mut self.players {
            let member = team.contains(&player.id);
            if member {
                player.team = Some(team.name.clone());
            } else if player.team.is_some() {
                player.team = None;
            }
        }
    }
}

fn describe_effect(effect: &AppliedEffect) -> String {
    match effect {
        AppliedEffect::PointsAdded(n) => format!("+{} points", n),
        AppliedEffect::PointsDeducted(n) => format!("-{} points", n),
        AppliedEffect::Penalty(kind, outcome) => format!("{:?} penalty ({:?})", kind, outcome),
        AppliedEffect::PowerUp(kind, _) => format!("{} granted", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ports::{ManualClock, MemoryStore, NotificationLog};
    use crate::game::types::PenaltyType;
    use chrono::TimeZone;

    type TestEngine = GameEngine<MemoryStore, NotificationLog, ManualClock>;

    fn engine() -> TestEngine {
        let start = Utc.with_ymd_and_hms(2026, 6, 3, 12, 0, 0).unwrap();
        GameEngine::new(
            MemoryStore::new(),
            NotificationLog::new(),
            ManualClock::new(start),
            EngineSettings::default(),
            RuleBook::empty(),
        )
        .with_rng_seed(3)
    }

    #[test]
    fn lifecycle_transitions() {
        let mut e = engine();
        assert!(!e.pause_game());
        assert!(!e.stop_game());
        assert!(e.start_game(GameMode::Classic, None));
        assert!(!e.start_game(GameMode::Classic, None));
        assert!(e.pause_game());
        assert!(!e.pause_game());
        assert!(e.resume_game());
        assert!(e.stop_game());
        assert_eq!(e.state(), GameState::Completed);
        assert!(!e.start_game(GameMode::Classic, None));
        assert!(!e.resume_game());

        e.reset_game();
        assert_eq!(e.state(), GameState::NotStarted);
        assert!(e.start_game(GameMode::Teams, None));
    }

    #[test]
    fn paused_time_does_not_count() {
        let mut e = engine();
        e.start_game(GameMode::Classic, Some(10 * 60_000));
        e.clock_mut().advance(Duration::minutes(4));
        e.pause_game();
        e.clock_mut().advance(Duration::minutes(30));
        e.resume_game();
        let now = e.clock().now();
        assert_eq!(e.session().remaining(now), Some(Duration::minutes(6)));
    }

    #[test]
    fn timed_game_completes_lazily() {
        let mut e = engine();
        let alice = e.add_player("Alice");
        e.start_game(GameMode::Classic, Some(60_000));
        assert!(e.handle_call(&alice, "cow").is_some());

        e.clock_mut().advance(Duration::seconds(61));
        // still marked in progress until something touches the session
        assert_eq!(e.state(), GameState::InProgress);
        assert!(e.handle_call(&alice, "cow").is_none());
        assert_eq!(e.state(), GameState::Completed);
        assert_eq!(e.player_score(&alice), Some(1));
    }

    #[test]
    fn events_need_a_running_game() {
        let mut e = engine();
        let alice = e.add_player("Alice");
        assert!(e.handle_call(&alice, "church").is_none());
        e.start_game(GameMode::Classic, None);
        e.pause_game();
        assert!(e.handle_call(&alice, "church").is_none());
        assert_eq!(e.player_score(&alice), Some(0));
    }

    #[test]
    fn huge_durations_do_not_end_the_game() {
        let mut e = engine();
        let alice = e.add_player("Alice");
        e.start_game(GameMode::Classic, Some(i64::MAX));
        let now = e.clock().now();
        e.apply_penalty_to_player(
            &alice,
            Penalty::new(PenaltyType::PointDeduction, 1, now).with_duration_ms(i64::MAX),
        );
        e.activate_power_up_for_player(&alice, PowerUpType::DoublePoints, i64::MAX, 2.0);

        e.clock_mut().advance(Duration::days(365));
        let outcome = e.handle_call(&alice, "church").unwrap();
        assert!(outcome.expired_penalties.is_empty());
        assert!(outcome.expired_power_ups.is_empty());
        assert_eq!(outcome.score, 2);
        assert_eq!(e.state(), GameState::InProgress);
    }

    #[test]
    fn session_elapsed_before_start_is_zero() {
        let session = GameSession::default();
        assert_eq!(session.elapsed(Utc::now()), Duration::zero());
        assert_eq!(session.remaining(Utc::now()), None);
    }

    #[test]
    fn team_join_rejects_members_of_other_teams() {
        let mut state = TeamState::new(Team::new("Herd"));
        let mut alice = Player::new("alice");
        alice.team = Some("Flock".to_string());
        assert!(!state.join(&mut alice));

        let mut bob = Player::new("bob");
        assert!(state.join(&mut bob));
        assert!(!state.join(&mut bob));
        assert!(state.leave(&mut bob));
        assert!(!state.leave(&mut bob));
        assert_eq!(bob.team, None);
    }
}
