use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::game::occasion::Occasion;

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const TEAM_SCHEMA_VERSION: u8 = 1;

/// Stable identity of a player across sessions.
pub type PlayerId = Uuid;

// ============================================================================
// Called objects
// ============================================================================

/// Colours that count as a "rainbow car" call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CarColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Indigo,
    Violet,
}

impl CarColor {
    pub const ALL: [CarColor; 7] = [
        CarColor::Red,
        CarColor::Orange,
        CarColor::Yellow,
        CarColor::Green,
        CarColor::Blue,
        CarColor::Indigo,
        CarColor::Violet,
    ];

    fn parse(name: &str) -> Option<Self> {
        match name {
            "red" => Some(CarColor::Red),
            "orange" => Some(CarColor::Orange),
            "yellow" => Some(CarColor::Yellow),
            "green" => Some(CarColor::Green),
            "blue" => Some(CarColor::Blue),
            "indigo" => Some(CarColor::Indigo),
            "violet" | "purple" => Some(CarColor::Violet),
            _ => None,
        }
    }
}

impl fmt::Display for CarColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CarColor::Red => "Red",
            CarColor::Orange => "Orange",
            CarColor::Yellow => "Yellow",
            CarColor::Green => "Green",
            CarColor::Blue => "Blue",
            CarColor::Indigo => "Indigo",
            CarColor::Violet => "Violet",
        };
        f.write_str(name)
    }
}

/// Road objects a player can call out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    Cow,
    Church,
    WaterTower,
    RainbowCar(CarColor),
}

impl ObjectType {
    /// Resolve a raw call ("Cow", "water tower", "Red Car", "violet") into an object type.
    /// Matching ignores case, whitespace, hyphens and underscores.
    pub fn parse(call: &str) -> Option<Self> {
        let normalized: String = call
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "cow" => Some(ObjectType::Cow),
            "church" => Some(ObjectType::Church),
            "watertower" => Some(ObjectType::WaterTower),
            other => {
                let color = other.strip_suffix("car").unwrap_or(other);
                CarColor::parse(color).map(ObjectType::RainbowCar)
            }
        }
    }

    /// Points awarded for a successful call.
    pub fn points(&self) -> u32 {
        match self {
            ObjectType::Cow => 1,
            ObjectType::Church => 2,
            ObjectType::WaterTower => 3,
            ObjectType::RainbowCar(_) => 5,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Cow => f.write_str("Cow"),
            ObjectType::Church => f.write_str("Church"),
            ObjectType::WaterTower => f.write_str("Water Tower"),
            ObjectType::RainbowCar(color) => write!(f, "{} Car", color),
        }
    }
}

/// What a player claims to have spotted, resolved at the boundary before
/// it reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalledObject {
    Object(ObjectType),
    ScavengerItem(String),
}

// ============================================================================
// Penalties and power-ups
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyType {
    PointDeduction,
    Silenced,
    TemporaryBan,
    FalseCall,
    TimePenalty,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Penalty {
    pub kind: PenaltyType,
    pub magnitude: u32,
    pub started_at: DateTime<Utc>,
    /// `None` keeps the penalty until it is explicitly cleared.
    pub duration_ms: Option<i64>,
    /// Free-form origin, e.g. the name of the custom rule that issued it.
    #[serde(default)]
    pub reason: Option<String>,
}

impl Penalty {
    pub fn new(kind: PenaltyType, magnitude: u32, started_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            magnitude,
            started_at,
            duration_ms: None,
            reason: None,
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    /// `None` for penalties that never expire, including durations past the
    /// end of the calendar.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.duration_ms
            .and_then(|ms| offset_by_ms(self.started_at, ms))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at(), Some(end) if end <= now)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpType {
    /// Doubles the adjusted score.
    DoublePoints,
    /// Multiplies the adjusted score by the effect value.
    ScoreMultiplier,
    /// Adds the effect value after multipliers.
    BonusPoints,
    /// Blocks every incoming penalty while active.
    Immunity,
    /// Absorbs the next incoming penalty, then breaks.
    Shield,
}

impl PowerUpType {
    pub fn is_multiplier(&self) -> bool {
        matches!(self, PowerUpType::DoublePoints | PowerUpType::ScoreMultiplier)
    }
}

impl fmt::Display for PowerUpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerUpType::DoublePoints => "Double Points",
            PowerUpType::ScoreMultiplier => "Score Multiplier",
            PowerUpType::BonusPoints => "Bonus Points",
            PowerUpType::Immunity => "Immunity",
            PowerUpType::Shield => "Shield",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerUp {
    pub kind: PowerUpType,
    pub activated_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub effect_value: f64,
}

impl PowerUp {
    pub fn new(
        kind: PowerUpType,
        activated_at: DateTime<Utc>,
        duration_ms: i64,
        effect_value: f64,
    ) -> Self {
        Self {
            kind,
            activated_at,
            duration_ms,
            effect_value,
        }
    }

    /// `None` when the duration runs past the end of the calendar.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        offset_by_ms(self.activated_at, self.duration_ms)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at(), Some(end) if end <= now)
    }
}

fn offset_by_ms(start: DateTime<Utc>, ms: i64) -> Option<DateTime<Utc>> {
    Duration::try_milliseconds(ms).and_then(|d| start.checked_add_signed(d))
}

// ============================================================================
// Conditions and custom rules
// ============================================================================

/// Predicate kinds a custom rule can be gated on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Always,
    /// Computed score strictly below the threshold
    ScoreBelow { threshold: u32 },
    /// Computed score strictly above the threshold
    ScoreAbove { threshold: u32 },
    /// Time of day within `[start, end)`; wraps midnight when `start > end`
    TimeWindow { start: NaiveTime, end: NaiveTime },
    SpecialEventActive { occasion: Occasion },
    TeamBased,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    pub kind: ConditionKind,
    #[serde(default)]
    pub description: String,
}

impl Condition {
    pub fn new(kind: ConditionKind, description: &str) -> Self {
        Self {
            kind,
            description: description.to_string(),
        }
    }

    pub fn always() -> Self {
        Self::new(ConditionKind::Always, "always")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuleEffect {
    AddPoints,
    DeductPoints,
    SilencePlayer,
    DoublePoints,
    PowerUpReward { power_up: PowerUpType },
    CustomPenalty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub effect: RuleEffect,
    #[serde(default)]
    pub magnitude: u32,
    /// Duration for silences, penalties and power-up rewards
    #[serde(default)]
    pub duration_ms: Option<i64>,
}

impl CustomRule {
    pub fn new(name: &str, effect: RuleEffect, magnitude: u32) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            conditions: Vec::new(),
            effect,
            magnitude,
            duration_ms: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

// ============================================================================
// Achievements
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    FirstCow,
    CowHerder,
    ChurchGoer,
    TowerSpotter,
    RainbowChaser,
    ScavengerMaster,
    TriviaWhiz,
    PointCollector,
    TeamPlayer,
}

/// A player's progress toward one achievement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerAchievement {
    pub kind: AchievementKind,
    pub progress: u32,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl PlayerAchievement {
    pub fn new(kind: AchievementKind) -> Self {
        Self {
            kind,
            progress: 0,
            unlocked: false,
            unlocked_at: None,
        }
    }

    pub fn increment(&mut self, amount: u32) {
        if !self.unlocked {
            self.progress = self.progress.saturating_add(amount);
        }
    }

    pub fn mark_unlocked(&mut self, now: DateTime<Utc>) {
        self.unlocked = true;
        self.unlocked_at = Some(now);
    }
}

// ============================================================================
// Players and teams
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cow_count: u32,
    pub church_count: u32,
    pub water_tower_count: u32,
    #[serde(default)]
    pub rainbow_car_count: u32,
    #[serde(default)]
    pub scavenger_items_found: u32,
    #[serde(default)]
    pub trivia_correct: u32,
    /// Raw accumulated points; penalties and power-ups apply at read time
    pub base_points: u32,
    #[serde(default)]
    pub penalties: Vec<Penalty>,
    #[serde(default)]
    pub power_ups: Vec<PowerUp>,
    /// Rule waiting to fire on this player's next event
    #[serde(default)]
    pub custom_rule: Option<CustomRule>,
    /// Name of the team this player belongs to
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub achievements: Vec<PlayerAchievement>,
    #[serde(default)]
    pub silenced: bool,
    #[serde(default)]
    pub banned: bool,
    pub schema_version: u8,
}

impl Player {
    pub fn new(name: &str) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(id: PlayerId, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            cow_count: 0,
            church_count: 0,
            water_tower_count: 0,
            rainbow_car_count: 0,
            scavenger_items_found: 0,
            trivia_correct: 0,
            base_points: 0,
            penalties: Vec::new(),
            power_ups: Vec::new(),
            custom_rule: None,
            team: None,
            achievements: Vec::new(),
            silenced: false,
            banned: false,
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_on_team(&self) -> bool {
        self.team.is_some()
    }

    /// Silenced and banned players cannot make calls.
    pub fn can_act(&self) -> bool {
        !self.silenced && !self.banned
    }

    pub fn achievement(&self, kind: AchievementKind) -> Option<&PlayerAchievement> {
        self.achievements.iter().find(|pa| pa.kind == kind)
    }

    pub fn has_unlocked(&self, kind: AchievementKind) -> bool {
        self.achievement(kind).is_some_and(|pa| pa.unlocked)
    }

    /// Zero the per-game counters, keeping identity, team and achievements.
    pub fn reset_progress(&mut self) {
        self.cow_count = 0;
        self.church_count = 0;
        self.water_tower_count = 0;
        self.rainbow_car_count = 0;
        self.scavenger_items_found = 0;
        self.trivia_correct = 0;
        self.base_points = 0;
        self.custom_rule = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub name: String,
    /// Member ids in join order
    pub members: Vec<PlayerId>,
    pub schema_version: u8,
}

impl Team {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            schema_version: TEAM_SCHEMA_VERSION,
        }
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.members.contains(id)
    }
}

// ============================================================================
// Scavenger hunts and trivia
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn points(&self) -> u32 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 4,
            Difficulty::Hard => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Rural,
    Town,
    Highway,
    Anywhere,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScavengerHuntItem {
    pub name: String,
    pub difficulty: Difficulty,
    pub location: LocationType,
    pub points: u32,
    pub found: bool,
    /// Lookup key of the player who found it
    pub found_by: Option<PlayerId>,
}

impl ScavengerHuntItem {
    pub fn new(name: &str, difficulty: Difficulty, location: LocationType) -> Self {
        Self {
            name: name.to_string(),
            difficulty,
            location,
            points: difficulty.points(),
            found: false,
            found_by: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriviaQuestion {
    pub prompt: String,
    pub choices: Vec<String>,
    pub answer: String,
    pub points: u32,
}

// ============================================================================
// Game lifecycle
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Classic,
    Teams,
    ScavengerHunt,
    Trivia,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::Classic => "Classic",
            GameMode::Teams => "Teams",
            GameMode::ScavengerHunt => "Scavenger Hunt",
            GameMode::Trivia => "Trivia",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    NotStarted,
    InProgress,
    Paused,
    Completed,
}
