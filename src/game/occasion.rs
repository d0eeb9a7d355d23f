//! Calendar of special occasions.
//!
//! `SpecialEventActive` conditions compare against the occasion in effect for
//! the current event. The engine derives it from the clock unless the config
//! pins one (handy for themed road trips and for tests).

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Occasion {
    NewYear,
    ValentinesDay,
    StPatricksDay,
    IndependenceDay,
    Halloween,
    Thanksgiving,
    Christmas,
}

impl Occasion {
    /// Occasion falling on `date`, if any.
    pub fn for_date(date: NaiveDate) -> Option<Self> {
        match (date.month(), date.day()) {
            (1, 1) => Some(Occasion::NewYear),
            (2, 14) => Some(Occasion::ValentinesDay),
            (3, 17) => Some(Occasion::StPatricksDay),
            (7, 4) => Some(Occasion::IndependenceDay),
            (10, 31) => Some(Occasion::Halloween),
            (12, 24) | (12, 25) => Some(Occasion::Christmas),
            (11, _) if is_thanksgiving(date) => Some(Occasion::Thanksgiving),
            _ => None,
        }
    }
}

/// Fourth Thursday of November.
fn is_thanksgiving(date: NaiveDate) -> bool {
    NaiveDate::from_weekday_of_month_opt(date.year(), 11, Weekday::Thu, 4) == Some(date)
}

impl fmt::Display for Occasion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Occasion::NewYear => "New Year's Day",
            Occasion::ValentinesDay => "Valentine's Day",
            Occasion::StPatricksDay => "St. Patrick's Day",
            Occasion::IndependenceDay => "Independence Day",
            Occasion::Halloween => "Halloween",
            Occasion::Thanksgiving => "Thanksgiving",
            Occasion::Christmas => "Christmas",
        };
        f.write_str(name)
    }
}
