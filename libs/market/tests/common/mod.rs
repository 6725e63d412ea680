//! In-memory stand-in for the remote table store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate};
use tokio::sync::oneshot;

use market::remote::{DEFAULT_PAGE_SIZE, RemoteTable, TableQuery, WriteMode};
use market::{MarketError, PricePoint, Result};

#[derive(Default)]
struct State {
    tables: Mutex<HashMap<String, Vec<PricePoint>>>,
    queries: Mutex<Vec<TableQuery>>,
    failing: AtomicBool,
    rejecting: AtomicBool,
    page_size: AtomicUsize,
    fetches: AtomicUsize,
    /// Rows written right after the fetch with this (1-based) number.
    staged: Mutex<Option<(usize, String, Vec<PricePoint>)>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

#[derive(Clone, Default)]
pub struct FakeTable {
    state: Arc<State>,
}

impl FakeTable {
    pub fn with_rows(table: &str, rows: Vec<PricePoint>) -> Self {
        let fake = Self::default();
        fake.seed(table, rows);
        fake
    }

    pub fn seed(&self, table: &str, rows: Vec<PricePoint>) {
        self.state
            .tables
            .lock()
            .unwrap()
            .insert(table.to_string(), rows);
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail reads with an error that is not a transport failure.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.state.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.state.page_size.store(page_size, Ordering::SeqCst);
    }

    /// Write `rows` (merged by date) as soon as fetch number `fetch` returns.
    pub fn write_after_fetch(&self, fetch: usize, table: &str, rows: Vec<PricePoint>) {
        *self.state.staged.lock().unwrap() = Some((fetch, table.to_string(), rows));
    }

    /// The next fetch waits until the returned sender fires (or is dropped).
    pub fn hold_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.state.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn queries(&self) -> Vec<TableQuery> {
        self.state.queries.lock().unwrap().clone()
    }

    pub fn rows(&self, table: &str) -> Vec<PricePoint> {
        self.state
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

impl RemoteTable for FakeTable {
    fn page_size(&self) -> usize {
        match self.state.page_size.load(Ordering::SeqCst) {
            0 => DEFAULT_PAGE_SIZE,
            n => n,
        }
    }

    async fn fetch(&self, table: &str, query: &TableQuery) -> Result<Vec<PricePoint>> {
        self.state.queries.lock().unwrap().push(query.clone());
        let fetch = self.state.fetches.fetch_add(1, Ordering::SeqCst) + 1;

        let gate = self.state.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.state.failing.load(Ordering::SeqCst) {
            return Err(MarketError::Remote {
                status: 503,
                body: "unavailable".into(),
            });
        }
        if self.state.rejecting.load(Ordering::SeqCst) {
            return Err(MarketError::InvalidConfig("rejected".into()));
        }

        let mut rows: Vec<PricePoint> = self
            .rows(table)
            .into_iter()
            .filter(|p| query.date_gte.is_none_or(|d| p.date >= d))
            .filter(|p| query.date_lte.is_none_or(|d| p.date <= d))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));

        let rows = match (query.range, query.limit) {
            (Some((from, to)), _) => rows.into_iter().skip(from).take(to + 1 - from).collect(),
            (None, Some(limit)) => rows.into_iter().take(limit).collect(),
            (None, None) => rows,
        };

        let staged = self.state.staged.lock().unwrap().take();
        match staged {
            Some((after, table, staged)) if after == fetch => {
                self.upsert(&table, &staged, WriteMode::Merge).await?;
            }
            other => *self.state.staged.lock().unwrap() = other,
        }
        Ok(rows)
    }

    async fn upsert(&self, table: &str, rows: &[PricePoint], mode: WriteMode) -> Result<()> {
        let mut tables = self.state.tables.lock().unwrap();
        let existing = tables.entry(table.to_string()).or_default();

        for row in rows {
            match existing.iter().position(|p| p.date == row.date) {
                Some(i) if mode == WriteMode::Merge => existing[i] = row.clone(),
                Some(_) => {}
                None => existing.push(row.clone()),
            }
        }
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `days` consecutive rows starting at `start`, ids counting from 1.
pub fn daily_rows(start: NaiveDate, days: usize) -> Vec<PricePoint> {
    (0..days)
        .map(|i| PricePoint {
            id: Some(i as i64 + 1),
            ..PricePoint::from_close(start + Duration::days(i as i64), 100.0 + i as f64, 1_000.0)
        })
        .collect()
}
