use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Upstream date format used for both cache partitioning and `created_after`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Body running a set of brackets. Tournaments from different organizers never
/// share a cache partition, even when they were created after the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Organizer {
    TravelingController,
    Sns,
}

impl Organizer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Organizer::TravelingController => "traveling_controller",
            Organizer::Sns => "sns",
        }
    }
}

impl fmt::Display for Organizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Organizer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "traveling_controller" => Ok(Organizer::TravelingController),
            "sns" => Ok(Organizer::Sns),
            other => Err(other.to_string()),
        }
    }
}

/// Cache partition: organizer first, then the "created after" lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub organizer: Organizer,
    pub date: NaiveDate,
}

impl CacheKey {
    pub fn new(organizer: Organizer, date: NaiveDate) -> Self {
        CacheKey { organizer, date }
    }

    /// The date as the upstream expects it in `created_after`.
    pub fn date_param(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.organizer, self.date_param())
    }
}

/// Participant roster for one tournament, as of one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentSnapshot {
    pub game_name: String,
    pub tournament_id: String,
    /// participant id → display name
    pub participant: HashMap<String, String>,
}

/// A pending match with participant ids already resolved to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub id: String,
    pub player1_name: String,
    pub player2_name: String,
    pub round: i32,
    pub suggested_play_order: i32,
    pub underway: bool,
    /// Station display name, empty when unassigned or unresolvable
    pub station: String,
}

/// Open matches of one tournament, sorted by suggested play order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TournamentMatches {
    pub game_name: String,
    pub tournament_id: String,
    pub match_list: Vec<Match>,
}
