//! Keeps a local [`SeriesStore`] consistent with one remote table.
//!
//! Loads are tagged with a monotonically increasing request id; a response
//! is only applied if its request is still the current one. Live changes
//! are applied one at a time under the write lock and are replayed on top
//! of any load that was in flight when they arrived.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Datelike, NaiveDate, Utc};
use futures_util::{Stream, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::asset::Asset;
use crate::error::{MarketError, Result};
use crate::point::PricePoint;
use crate::remote::{ChangeEvent, ChangeKind, RemoteTable, TableQuery};
use crate::series::SeriesStore;
use crate::synthetic;

/// Length of the synthetic series served for unbounded requests.
pub const FALLBACK_DAYS: usize = 365;

/// Upper bound on any synthetic series, whatever the request asked for.
pub const MAX_FALLBACK_DAYS: usize = FALLBACK_DAYS * 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    /// The most recent `n` rows.
    Trailing(usize),
    /// Rows dated within one calendar year, inclusive.
    Year(i32),
    /// Every row, paged past the per-request cap.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Empty,
    Loading,
    Synced,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Remote,
    /// Locally generated after a failed fetch.
    Synthetic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub request_id: u64,
    pub source: DataSource,
    pub points: usize,
    /// Set when the data is a fallback; the failure that caused it.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    Applied,
    /// Applied and queued for replay over the load in flight.
    Deferred,
}

struct Inner {
    store: SeriesStore,
    state: SyncState,
    source: Option<DataSource>,
    last_error: Option<String>,
    current: Option<(u64, LoadRequest)>,
    pending: Vec<ChangeEvent>,
}

pub struct SeriesSync<R> {
    asset: Asset,
    remote: R,
    page_size: usize,
    requests: AtomicU64,
    inner: RwLock<Inner>,
}

impl<R: RemoteTable> SeriesSync<R> {
    /// Pages at the remote's own row cap.
    pub fn new(asset: Asset, remote: R) -> Self {
        let page_size = remote.page_size();
        Self::with_page_size(asset, remote, page_size)
    }

    pub fn with_page_size(asset: Asset, remote: R, page_size: usize) -> Self {
        Self {
            asset,
            remote,
            page_size: page_size.max(1),
            requests: AtomicU64::new(0),
            inner: RwLock::new(Inner {
                store: SeriesStore::new(),
                state: SyncState::Empty,
                source: None,
                last_error: None,
                current: None,
                pending: Vec::new(),
            }),
        }
    }

    pub fn asset(&self) -> Asset {
        self.asset
    }

    pub fn state(&self) -> SyncState {
        self.read().state
    }

    pub fn source(&self) -> Option<DataSource> {
        self.read().source
    }

    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    pub fn current_request(&self) -> Option<LoadRequest> {
        self.read().current.map(|(_, request)| request)
    }

    /// Run `f` against a consistent view of the series.
    pub fn with_series<T>(&self, f: impl FnOnce(&SeriesStore) -> T) -> T {
        f(&self.read().store)
    }

    pub fn snapshot(&self) -> SeriesStore {
        self.read().store.clone()
    }

    /// Load `request`, replacing the local series.
    ///
    /// If a newer load starts before this one resolves, the response is
    /// dropped and [`MarketError::Superseded`] is returned. Transport failures
    /// install a synthetic series instead and report it in the outcome.
    #[instrument(skip(self), fields(asset = %self.asset))]
    pub async fn load(&self, request: LoadRequest) -> Result<LoadOutcome> {
        let request_id = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut inner = self.write();
            inner.current = Some((request_id, request));
            inner.state = SyncState::Loading;
        }
        debug!(request_id, "load started");

        let fetched = self.fetch(request).await;

        let mut inner = self.write();
        match inner.current {
            Some((current, _)) if current == request_id => {}
            other => {
                let current = other.map(|(id, _)| id).unwrap_or_default();
                debug!(request_id, current, "discarding stale response");
                return Err(MarketError::Superseded {
                    requested: request_id,
                    current,
                });
            }
        }

        let (store, source, error) = match fetched {
            Ok(rows) => (SeriesStore::from_points(rows), DataSource::Remote, None),
            Err(e) if e.is_transport() => {
                warn!(error = %e, request_id, "fetch failed, serving synthetic series");
                let rows = fallback(self.asset, request, Utc::now().date_naive());
                (SeriesStore::from_points(rows), DataSource::Synthetic, Some(e.to_string()))
            }
            Err(e) => {
                warn!(error = %e, request_id, "load failed");
                inner.state = SyncState::Error;
                inner.last_error = Some(e.to_string());
                inner.pending.clear();
                return Err(e);
            }
        };

        inner.store = store;
        let pending = std::mem::take(&mut inner.pending);
        let replayed = pending.len();
        for event in &pending {
            if let Err(e) = merge(&mut inner.store, event) {
                warn!(error = %e, "dropping buffered change");
            }
        }

        inner.state = SyncState::Synced;
        inner.source = Some(source);
        inner.last_error = error.clone();

        let points = inner.store.len();
        info!(request_id, points, replayed, ?source, "series synced");

        Ok(LoadOutcome {
            request_id,
            source,
            points,
            error,
        })
    }

    /// Apply one live change. Malformed payloads leave the series untouched.
    pub fn apply_change(&self, event: &ChangeEvent) -> Result<ChangeOutcome> {
        let mut inner = self.write();
        merge(&mut inner.store, event)?;

        if inner.state == SyncState::Loading {
            inner.pending.push(event.clone());
            return Ok(ChangeOutcome::Deferred);
        }
        Ok(ChangeOutcome::Applied)
    }

    /// Apply every change from `events` until the stream ends.
    ///
    /// Returns how many were applied; malformed ones are logged and skipped.
    #[instrument(skip(self, events), fields(asset = %self.asset))]
    pub async fn follow<S>(&self, events: S) -> usize
    where
        S: Stream<Item = ChangeEvent>,
    {
        let mut events = std::pin::pin!(events);
        let mut applied = 0;

        while let Some(event) = events.next().await {
            match self.apply_change(&event) {
                Ok(_) => applied += 1,
                Err(e) => warn!(error = %e, kind = ?event.kind, "skipping change"),
            }
        }

        info!(applied, "change feed ended");
        applied
    }

    async fn fetch(&self, request: LoadRequest) -> Result<Vec<PricePoint>> {
        let table = self.asset.table();
        match request {
            LoadRequest::Trailing(n) => {
                let mut rows = self.remote.fetch(table, &TableQuery::latest(n)).await?;
                rows.reverse();
                Ok(rows)
            }
            LoadRequest::Year(year) => {
                let (from, to) = year_bounds(year)?;
                self.fetch_paged(&TableQuery::between(from, to)).await
            }
            LoadRequest::All => self.fetch_paged(&TableQuery::default()).await,
        }
    }

    /// Sequential pages until one comes back short.
    async fn fetch_paged(&self, query: &TableQuery) -> Result<Vec<PricePoint>> {
        let table = self.asset.table();
        let mut rows = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .remote
                .fetch(table, &query.page(offset, self.page_size))
                .await?;
            let len = page.len();
            rows.extend(page);
            debug!(offset, len, "fetched page");

            if len < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        Ok(rows)
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Apply one change to `store`. Re-applying the same change is a no-op.
pub fn merge(store: &mut SeriesStore, event: &ChangeEvent) -> Result<()> {
    match event.kind {
        ChangeKind::Insert => {
            let row = event.new_row()?;
            store.upsert([row]);
        }
        ChangeKind::Update => {
            let row = event.new_row()?;
            // Only rows already in the window are replaced: by id, else by date.
            let matched = row
                .id
                .and_then(|id| store.find_by_id(id))
                .or_else(|| store.get(row.date))
                .map(|p| p.date);

            match matched {
                Some(date) => {
                    if date != row.date
                        && let Some(id) = row.id
                    {
                        store.remove_by_id(id);
                    }
                    store.upsert([row]);
                }
                None => debug!(date = %row.date, "update outside loaded series, ignored"),
            }
        }
        ChangeKind::Delete => {
            let key = event.old_key()?;
            let removed = key.id.map(|id| store.remove_by_id(id).len()).unwrap_or(0);
            if removed == 0
                && let Some(date) = key.date
            {
                store.remove_by_key(date);
            }
        }
    }
    Ok(())
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let from = NaiveDate::from_ymd_opt(year, 1, 1);
    let to = NaiveDate::from_ymd_opt(year, 12, 31);
    from.zip(to)
        .ok_or_else(|| MarketError::InvalidConfig(format!("year {year} out of range")))
}

/// Synthetic stand-in sized like the request, never dated after `today`.
pub fn fallback(asset: Asset, request: LoadRequest, today: NaiveDate) -> Vec<PricePoint> {
    match request {
        LoadRequest::Trailing(n) => synthetic::generate(asset, n.min(MAX_FALLBACK_DAYS), today),
        LoadRequest::All => synthetic::generate(asset, FALLBACK_DAYS, today),
        LoadRequest::Year(year) => {
            let Ok((from, to)) = year_bounds(year) else {
                return Vec::new();
            };
            let end = to.min(today);
            if end < from {
                return Vec::new();
            }
            let days = (end - from).num_days() as usize + 1;
            let rows = synthetic::generate(asset, days, end);
            debug_assert!(rows.iter().all(|p| p.date.year() == year));
            rows
        }
    }
}
