use chrono::NaiveDate;
use std::collections::HashMap;

use crate::error::RequestError;
use crate::models::{CacheKey, Organizer, DATE_FORMAT};

/// Validated `/v1/matches` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestValues {
    pub date: NaiveDate,
    pub organizer: Organizer,
    /// Exact game names to keep; empty keeps everything
    pub game_list: Vec<String>,
}

impl RequestValues {
    /// Parse `date` (YYYY-MM-DD, required), `tournamentOrg` (required) and
    /// `games` (comma-separated, optional).
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, RequestError> {
        let date_str = params
            .get("date")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or(RequestError::DateNotProvided)?;
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
            .map_err(|_| RequestError::DateIncorrectFormat)?;

        let organizer = params
            .get("tournamentOrg")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or(RequestError::OrganizerNotProvided)?
            .parse::<Organizer>()
            .map_err(RequestError::UnknownOrganizer)?;

        let game_list = params
            .get("games")
            .map(|games| {
                games
                    .split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(RequestValues {
            date,
            organizer,
            game_list,
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.organizer, self.date)
    }
}
