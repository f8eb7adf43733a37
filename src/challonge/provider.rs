use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::UpstreamError;
use crate::models::{TournamentMatches, TournamentSnapshot};

/// Source of tournament, participant and match data.
#[async_trait]
pub trait FetchData: Send + Sync {
    /// In-progress tournaments created after `date` (`YYYY-MM-DD`), as
    /// tournament id → game name.
    async fn fetch_tournaments(&self, date: &str) -> Result<HashMap<String, String>, UpstreamError>;

    /// Full participant roster of one tournament.
    async fn fetch_participants(
        &self,
        tournament_id: &str,
        game_name: &str,
    ) -> Result<TournamentSnapshot, UpstreamError>;

    /// Open matches of one tournament, ordered by suggested play order.
    async fn fetch_matches(
        &self,
        snapshot: &TournamentSnapshot,
    ) -> Result<TournamentMatches, UpstreamError>;
}
