//! In-memory tournament/participant cache gating how often the bracket API is
//! walked.
//!
//! Entries are keyed by organizer, then by the "created after" date. An entry
//! is never edited in place: a refresh builds the complete snapshot list first
//! and swaps it in under the write lock, so readers see either the previous
//! roster set or the new one. A failed refresh leaves the previous entry alone.
//!
//! Staleness is computed on read (`now - fetched_at >= update_ttl`). Separately,
//! the whole cache is wiped once `clear_ttl` has passed since the last wipe so
//! dates nobody asks for anymore do not pile up.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::challonge::FetchData;
use crate::error::UpstreamError;
use crate::fan_out::fan_out;
use crate::models::{CacheKey, Organizer, TournamentSnapshot};

struct CacheEntry {
    snapshots: Vec<TournamentSnapshot>,
    fetched_at: Instant,
}

struct CacheInner {
    data: HashMap<Organizer, HashMap<NaiveDate, CacheEntry>>,
    last_cleared_at: Instant,
}

impl CacheInner {
    fn entry(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.data.get(&key.organizer)?.get(&key.date)
    }
}

/// Rebuild coordination for one key.
///
/// `gate` serialises rebuilds and holds the error of the last finished
/// attempt (`None` after a success). `finished` counts finished attempts so a
/// caller can tell whether one completed while it was queued on `gate`.
#[derive(Default)]
struct RefreshSlot {
    gate: Mutex<Option<Arc<UpstreamError>>>,
    finished: AtomicU64,
}

/// Thread-safe handle to the tournament cache. Clones share state.
#[derive(Clone)]
pub struct TournamentCache {
    inner: Arc<RwLock<CacheInner>>,
    refresh_slots: Arc<Mutex<HashMap<CacheKey, Arc<RefreshSlot>>>>,
    update_ttl: Duration,
    clear_ttl: Duration,
}

impl TournamentCache {
    pub fn new(update_ttl: Duration, clear_ttl: Duration) -> Self {
        TournamentCache {
            inner: Arc::new(RwLock::new(CacheInner {
                data: HashMap::new(),
                last_cleared_at: Instant::now(),
            })),
            refresh_slots: Arc::new(Mutex::new(HashMap::new())),
            update_ttl,
            clear_ttl,
        }
    }

    /// True when `key` has never been populated or its entry has gone stale.
    pub async fn should_update(&self, key: &CacheKey) -> bool {
        match self.inner.read().await.entry(key) {
            Some(entry) => entry.fetched_at.elapsed() >= self.update_ttl,
            None => true,
        }
    }

    /// True when `key` has no entry or its entry holds no tournaments.
    #[allow(dead_code)]
    pub async fn is_empty_at(&self, key: &CacheKey) -> bool {
        self.inner
            .read()
            .await
            .entry(key)
            .map_or(true, |entry| entry.snapshots.is_empty())
    }

    /// Rebuild the entry for `key` from upstream.
    ///
    /// Lists the tournaments, then fetches every roster concurrently. Only a
    /// fully successful rebuild is published; zero tournaments is a valid
    /// result and is stored as an empty entry.
    pub async fn refresh(
        &self,
        key: CacheKey,
        client: Arc<dyn FetchData>,
    ) -> Result<(), UpstreamError> {
        info!("Refreshing tournament cache for {}", key);
        let tournaments = client.fetch_tournaments(&key.date_param()).await?;

        let snapshots = if tournaments.is_empty() {
            Vec::new()
        } else {
            fan_out(tournaments, |(tournament_id, game_name)| {
                let client = Arc::clone(&client);
                async move { client.fetch_participants(&tournament_id, &game_name).await }
            })
            .await?
        };

        let entry = CacheEntry {
            snapshots,
            fetched_at: Instant::now(),
        };
        let count = entry.snapshots.len();

        let mut inner = self.inner.write().await;
        inner
            .data
            .entry(key.organizer)
            .or_default()
            .insert(key.date, entry);
        info!("Cached {} tournaments for {}", count, key);
        Ok(())
    }

    /// Refresh `key` if it is stale, with at most one rebuild in flight per
    /// key. Callers queued behind a rebuild take its outcome: a success leaves
    /// the key fresh, a failure is returned to every one of them as
    /// `UpstreamError::Shared` instead of being retried in turn. Returns
    /// whether this call performed the rebuild.
    pub async fn ensure_fresh(
        &self,
        key: CacheKey,
        client: Arc<dyn FetchData>,
    ) -> Result<bool, UpstreamError> {
        let slot = {
            let mut slots = self.refresh_slots.lock().await;
            Arc::clone(slots.entry(key).or_default())
        };
        let seen = slot.finished.load(Ordering::SeqCst);
        let mut last_failure = slot.gate.lock().await;

        if slot.finished.load(Ordering::SeqCst) > seen {
            if let Some(err) = last_failure.as_ref() {
                debug!("Sharing failed refresh of {} with a queued caller", key);
                return Err(UpstreamError::Shared(Arc::clone(err)));
            }
        }
        if !self.should_update(&key).await {
            debug!("Cache for {} is fresh", key);
            return Ok(false);
        }

        let outcome = self.refresh(key, client).await;
        slot.finished.fetch_add(1, Ordering::SeqCst);
        match outcome {
            Ok(()) => {
                *last_failure = None;
                debug!("Tournament cache now holds {} keys", self.len().await);
                Ok(true)
            }
            Err(err) => {
                let err = Arc::new(err);
                *last_failure = Some(Arc::clone(&err));
                Err(UpstreamError::Shared(err))
            }
        }
    }

    /// Snapshots cached for `key`, restricted to `game_filter` members when the
    /// filter is non-empty. Game names must match exactly.
    pub async fn read(&self, key: &CacheKey, game_filter: &[String]) -> Vec<TournamentSnapshot> {
        self.read_if_present(key, game_filter)
            .await
            .unwrap_or_default()
    }

    /// Like `read`, but `None` when `key` has no entry at all, so an absent
    /// key is distinguishable from one holding zero tournaments.
    pub async fn read_if_present(
        &self,
        key: &CacheKey,
        game_filter: &[String],
    ) -> Option<Vec<TournamentSnapshot>> {
        let inner = self.inner.read().await;
        let entry = inner.entry(key)?;

        Some(
            entry
                .snapshots
                .iter()
                .filter(|s| game_filter.is_empty() || game_filter.contains(&s.game_name))
                .cloned()
                .collect(),
        )
    }

    /// Ensure `key` is fresh and read it in one step. If a concurrent
    /// `clear_all` drops the entry between the refresh and the read, the key is
    /// refreshed once more rather than reported as empty.
    pub async fn fresh_snapshots(
        &self,
        key: CacheKey,
        client: Arc<dyn FetchData>,
        game_filter: &[String],
    ) -> Result<Vec<TournamentSnapshot>, UpstreamError> {
        self.ensure_fresh(key, Arc::clone(&client)).await?;
        if let Some(snapshots) = self.read_if_present(&key, game_filter).await {
            return Ok(snapshots);
        }

        debug!("Entry for {} was cleared before it could be read", key);
        self.ensure_fresh(key, client).await?;
        Ok(self.read(&key, game_filter).await)
    }

    /// True once `clear_ttl` has passed since the last wipe.
    pub async fn should_clear_all(&self) -> bool {
        self.inner.read().await.last_cleared_at.elapsed() >= self.clear_ttl
    }

    /// Drop every entry and restart the clear clock. Does not check
    /// `should_clear_all` itself.
    pub async fn clear_all(&self) {
        {
            let mut inner = self.inner.write().await;
            let keys: usize = inner.data.values().map(HashMap::len).sum();
            inner.data.clear();
            inner.last_cleared_at = Instant::now();
            info!("Cleared tournament cache ({} keys)", keys);
        }
        // Slots nobody is holding or waiting on can go with their entries
        self.refresh_slots
            .lock()
            .await
            .retain(|_, slot| Arc::strong_count(slot) > 1);
    }

    /// Number of populated keys across all organizers.
    pub async fn len(&self) -> usize {
        self.inner.read().await.data.values().map(HashMap::len).sum()
    }
}
