//! Scripted `FetchData` for exercising fan-out and refresh coordination.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::provider::FetchData;
use crate::error::UpstreamError;
use crate::models::{Match, TournamentMatches, TournamentSnapshot};

#[derive(Default)]
pub struct ScriptedFetch {
    /// tournament id → game name
    pub tournaments: HashMap<String, String>,
    /// Tournament ids whose participant fetch fails with 502
    pub failing_participants: HashSet<String>,
    /// Tournament ids whose match fetch fails with 502
    pub failing_matches: HashSet<String>,
    /// Per-call latency, to widen race windows
    pub delay: Duration,
    pub tournament_calls: AtomicUsize,
    pub participant_calls: AtomicUsize,
    pub match_calls: AtomicUsize,
}

impl ScriptedFetch {
    pub fn with_tournaments(pairs: &[(&str, &str)]) -> Self {
        ScriptedFetch {
            tournaments: pairs
                .iter()
                .map(|(id, game)| (id.to_string(), game.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, tournament_id: &str) -> Self {
        self.failing_participants.insert(tournament_id.to_string());
        self
    }

    pub fn failing_on_matches(mut self, tournament_id: &str) -> Self {
        self.failing_matches.insert(tournament_id.to_string());
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check(failing: &HashSet<String>, tournament_id: &str) -> Result<(), UpstreamError> {
        if failing.contains(tournament_id) {
            return Err(UpstreamError::Status {
                status: StatusCode::BAD_GATEWAY,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FetchData for ScriptedFetch {
    async fn fetch_tournaments(&self, _date: &str) -> Result<HashMap<String, String>, UpstreamError> {
        self.tournament_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.tournaments.clone())
    }

    async fn fetch_participants(
        &self,
        tournament_id: &str,
        game_name: &str,
    ) -> Result<TournamentSnapshot, UpstreamError> {
        self.participant_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Self::check(&self.failing_participants, tournament_id)?;
        Ok(TournamentSnapshot {
            game_name: game_name.to_string(),
            tournament_id: tournament_id.to_string(),
            participant: HashMap::from([
                ("p1".to_string(), format!("{}-player1", tournament_id)),
                ("p2".to_string(), format!("{}-player2", tournament_id)),
            ]),
        })
    }

    async fn fetch_matches(
        &self,
        snapshot: &TournamentSnapshot,
    ) -> Result<TournamentMatches, UpstreamError> {
        self.match_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Self::check(&self.failing_matches, &snapshot.tournament_id)?;
        Ok(TournamentMatches {
            game_name: snapshot.game_name.clone(),
            tournament_id: snapshot.tournament_id.clone(),
            match_list: vec![Match {
                id: format!("{}-m1", snapshot.tournament_id),
                player1_name: format!("{}-player1", snapshot.tournament_id),
                player2_name: format!("{}-player2", snapshot.tournament_id),
                round: 1,
                suggested_play_order: 1,
                underway: false,
                station: String::new(),
            }],
        })
    }
}
