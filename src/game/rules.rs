//! Per-mode rule sets applied when a game starts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::game::occasion::Occasion;
use crate::game::types::{Condition, ConditionKind, CustomRule, GameMode, PowerUpType, RuleEffect};

/// A custom rule bound to the mode it belongs to (config `[[rules]]` entry).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModeRule {
    pub mode: GameMode,
    #[serde(flatten)]
    pub rule: CustomRule,
}

#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: HashMap<GameMode, Vec<CustomRule>>,
}

impl RuleBook {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in rules shipped with the game.
    pub fn defaults() -> Self {
        let mut book = Self::empty();

        book.add(
            GameMode::Classic,
            CustomRule::new("Festive head start", RuleEffect::AddPoints, 5)
                .with_description("Everyone starts with 5 points on Christmas")
                .with_condition(Condition::new(
                    ConditionKind::SpecialEventActive {
                        occasion: Occasion::Christmas,
                    },
                    "it's Christmas",
                )),
        );
        book.add(
            GameMode::Classic,
            CustomRule::new(
                "Spooky shield",
                RuleEffect::PowerUpReward {
                    power_up: PowerUpType::Shield,
                },
                1,
            )
            .with_description("A free shield on Halloween")
            .with_condition(Condition::new(
                ConditionKind::SpecialEventActive {
                    occasion: Occasion::Halloween,
                },
                "it's Halloween",
            ))
            .with_duration_ms(30 * 60_000),
        );
        book.add(
            GameMode::Teams,
            CustomRule::new("Team spirit", RuleEffect::DoublePoints, 0)
                .with_description("Team members score double for the first five minutes")
                .with_condition(Condition::new(ConditionKind::TeamBased, "on a team"))
                .with_duration_ms(5 * 60_000),
        );
        book.add(
            GameMode::ScavengerHunt,
            CustomRule::new(
                "Hunter's luck",
                RuleEffect::PowerUpReward {
                    power_up: PowerUpType::BonusPoints,
                },
                2,
            )
            .with_description("Two bonus points while the hunt warms up")
            .with_condition(Condition::always())
            .with_duration_ms(10 * 60_000),
        );

        book
    }

    /// Defaults plus configured rules, appended after the built-ins.
    pub fn with_overrides(mut self, extra: &[ModeRule]) -> Self {
        for entry in extra {
            self.add(entry.mode, entry.rule.clone());
        }
        self
    }

    pub fn add(&mut self, mode: GameMode, rule: CustomRule) {
        self.rules.entry(mode).or_default().push(rule);
    }

    pub fn rules_for(&self, mode: GameMode) -> &[CustomRule] {
        self.rules.get(&mode).map(Vec::as_slice).unwrap_or(&[])
    }
}
