//! Scavenger hunt lists.
//!
//! A hunt is drawn at random from a built-in catalogue of roadside sights,
//! optionally restricted to one kind of road. Items are claimed by name.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::types::{Difficulty, LocationType, PlayerId, ScavengerHuntItem};

const CATALOG: &[(&str, Difficulty, LocationType)] = &[
    ("Red Barn", Difficulty::Easy, LocationType::Rural),
    ("Tractor", Difficulty::Easy, LocationType::Rural),
    ("Horse", Difficulty::Easy, LocationType::Rural),
    ("Hay Bales", Difficulty::Easy, LocationType::Rural),
    ("Scarecrow", Difficulty::Hard, LocationType::Rural),
    ("Windmill", Difficulty::Medium, LocationType::Rural),
    ("Silo", Difficulty::Easy, LocationType::Rural),
    ("Fire Hydrant", Difficulty::Easy, LocationType::Town),
    ("Ice Cream Shop", Difficulty::Medium, LocationType::Town),
    ("Clock Tower", Difficulty::Hard, LocationType::Town),
    ("Mailbox", Difficulty::Easy, LocationType::Town),
    ("School Bus", Difficulty::Medium, LocationType::Town),
    ("Police Car", Difficulty::Medium, LocationType::Anywhere),
    ("Motorcycle", Difficulty::Easy, LocationType::Anywhere),
    ("Convertible", Difficulty::Medium, LocationType::Anywhere),
    ("Out-of-State Plate", Difficulty::Medium, LocationType::Highway),
    ("Semi Truck", Difficulty::Easy, LocationType::Highway),
    ("Rest Stop", Difficulty::Easy, LocationType::Highway),
    ("Billboard With A Cow", Difficulty::Hard, LocationType::Highway),
    ("Car Towing A Boat", Difficulty::Hard, LocationType::Highway),
    ("Bridge", Difficulty::Medium, LocationType::Anywhere),
    ("Hot Air Balloon", Difficulty::Hard, LocationType::Anywhere),
];

/// Every item the game knows about, unfound.
pub fn catalog_items() -> Vec<ScavengerHuntItem> {
    CATALOG
        .iter()
        .map(|(name, difficulty, location)| ScavengerHuntItem::new(name, *difficulty, *location))
        .collect()
}

/// Result of claiming an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindResult {
    Found { points: u32 },
    AlreadyFound,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScavengerHunt {
    pub items: Vec<ScavengerHuntItem>,
}

impl ScavengerHunt {
    pub fn new(items: Vec<ScavengerHuntItem>) -> Self {
        Self { items }
    }

    /// Draw `count` distinct items. `location` keeps items for that road type
    /// plus the ones seen anywhere.
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        count: usize,
        location: Option<LocationType>,
    ) -> Self {
        let pool: Vec<ScavengerHuntItem> = catalog_items()
            .into_iter()
            .filter(|item| match location {
                None | Some(LocationType::Anywhere) => true,
                Some(loc) => item.location == loc || item.location == LocationType::Anywhere,
            })
            .collect();
        let items = pool.choose_multiple(rng, count).cloned().collect();
        Self { items }
    }

    /// Claim an item by name (case-insensitive) for `player`.
    pub fn mark_found(&mut self, name: &str, player: PlayerId) -> FindResult {
        let needle = name.trim();
        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.name.eq_ignore_ascii_case(needle))
        else {
            return FindResult::Unknown;
        };
        if item.found {
            return FindResult::AlreadyFound;
        }
        item.found = true;
        item.found_by = Some(player);
        FindResult::Found {
            points: item.points,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ScavengerHuntItem> {
        let needle = name.trim();
        self.items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(needle))
    }

    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|item| !item.found).count()
    }

    pub fn is_complete(&self) -> bool {
        !self.items.is_empty() && self.remaining() == 0
    }

    /// Forget who found what, keeping the same list.
    pub fn reset(&mut self) {
        for item in &mut self.items {
            item.found = false;
            item.found_by = None;
        }
    }
}
