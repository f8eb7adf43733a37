use std::sync::Arc;
use tracing::debug;

use crate::challonge::FetchData;
use crate::error::UpstreamError;
use crate::fan_out::fan_out;
use crate::models::{TournamentMatches, TournamentSnapshot};

/// Fetch open matches for every snapshot concurrently.
///
/// Latency is that of the slowest tournament. Any failure fails the whole
/// call. The result is ordered by game name (then tournament id) regardless of
/// completion order.
pub async fn fetch_matches_concurrently(
    snapshots: Vec<TournamentSnapshot>,
    client: Arc<dyn FetchData>,
) -> Result<Vec<TournamentMatches>, UpstreamError> {
    if snapshots.is_empty() {
        return Ok(Vec::new());
    }

    let tournaments = snapshots.len();
    let mut matches = fan_out(snapshots, |snapshot| {
        let client = Arc::clone(&client);
        async move { client.fetch_matches(&snapshot).await }
    })
    .await?;

    matches.sort_by(|a, b| {
        a.game_name
            .cmp(&b.game_name)
            .then_with(|| a.tournament_id.cmp(&b.tournament_id))
    });

    debug!(
        "Fetched {} open matches across {} tournaments",
        matches.iter().map(|t| t.match_list.len()).sum::<usize>(),
        tournaments
    );
    Ok(matches)
}
