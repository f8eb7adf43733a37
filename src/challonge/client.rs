use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::documents::{self, Document, MatchesDocument, ParticipantsDocument, TournamentsDocument};
use super::provider::FetchData;
use crate::error::UpstreamError;
use crate::models::{TournamentMatches, TournamentSnapshot};

/// Page size for the tournament and participant collections.
const PAGE_SIZE: &str = "25";
/// Page size for open matches; a single page is requested.
const MATCH_PAGE_SIZE: &str = "50";
/// Upper bound on pages walked for one collection (25 000 records).
const MAX_PAGES: usize = 1000;

/// Client for the Challonge v2.1 API.
#[derive(Clone)]
pub struct ChallongeClient {
    http: Client,
    base_url: String,
    api_key: String,
    max_pages: usize,
}

impl ChallongeClient {
    /// `timeout` bounds every individual request; there is no batch deadline.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ChallongeClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            max_pages: MAX_PAGES,
        })
    }

    #[cfg(test)]
    fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    async fn get_document<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, params);

        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/vnd.api+json")
            .header("Authorization-Type", "v1")
            .header("Authorization", &self.api_key)
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status { status });
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(UpstreamError::decode)
    }

    /// Request page 1, 2, 3, … until a page comes back with no records,
    /// handing every non-empty page to `merge`. The record count in `meta` is
    /// not trusted. An upstream still returning records after `max_pages`
    /// pages is treated as malformed.
    async fn walk_pages<R, F>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        mut merge: F,
    ) -> Result<usize, UpstreamError>
    where
        R: DeserializeOwned + Send,
        F: FnMut(Document<R>) + Send,
    {
        let mut page = 1usize;
        loop {
            let page_str = page.to_string();
            let mut query = params.to_vec();
            query.push(("page", page_str.as_str()));
            query.push(("per_page", PAGE_SIZE));

            let doc: Document<R> = self.get_document(path, &query).await?;
            if doc.data.is_empty() {
                return Ok(page - 1);
            }
            if page > self.max_pages {
                return Err(UpstreamError::decode(format!(
                    "{} still returning records after {} pages",
                    path, self.max_pages
                )));
            }
            merge(doc);
            page += 1;
        }
    }
}

#[async_trait]
impl FetchData for ChallongeClient {
    async fn fetch_tournaments(&self, date: &str) -> Result<HashMap<String, String>, UpstreamError> {
        let mut tournaments = HashMap::new();
        let pages = self
            .walk_pages(
                "/tournaments.json",
                &[("state", "in_progress"), ("created_after", date)],
                |doc: TournamentsDocument| documents::merge_tournament_page(doc, &mut tournaments),
            )
            .await?;

        debug!(
            "Fetched {} tournaments created after {} ({} pages)",
            tournaments.len(),
            date,
            pages
        );
        Ok(tournaments)
    }

    async fn fetch_participants(
        &self,
        tournament_id: &str,
        game_name: &str,
    ) -> Result<TournamentSnapshot, UpstreamError> {
        let path = format!("/tournaments/{}/participants.json", tournament_id);
        let mut participant = HashMap::new();
        let pages = self
            .walk_pages(&path, &[], |doc: ParticipantsDocument| {
                documents::merge_participant_page(doc, &mut participant)
            })
            .await?;

        debug!(
            "Fetched {} participants for tournament {} ({} pages)",
            participant.len(),
            tournament_id,
            pages
        );
        Ok(TournamentSnapshot {
            game_name: game_name.to_string(),
            tournament_id: tournament_id.to_string(),
            participant,
        })
    }

    async fn fetch_matches(
        &self,
        snapshot: &TournamentSnapshot,
    ) -> Result<TournamentMatches, UpstreamError> {
        let path = format!("/tournaments/{}/matches.json", snapshot.tournament_id);
        let doc: MatchesDocument = self
            .get_document(
                &path,
                &[("page", "1"), ("per_page", MATCH_PAGE_SIZE), ("state", "open")],
            )
            .await?;

        let matches = documents::tournament_matches(snapshot, doc);
        debug!(
            "Fetched {} open matches for tournament {}",
            matches.match_list.len(),
            snapshot.tournament_id
        );
        Ok(matches)
    }
}
