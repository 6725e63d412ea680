//! Boundary to the remote table store: reads, keyed writes and the shape of
//! its live change notifications.

mod change;
mod rest;

pub use change::{ChangeEvent, ChangeKind, RowKey};
pub use rest::{DEFAULT_PAGE_SIZE, RemoteConfig, RestTable};

use std::future::Future;

use chrono::NaiveDate;

use crate::error::Result;
use crate::point::PricePoint;

/// One read against a table, always ordered by date descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    pub limit: Option<usize>,
    /// Inclusive row offsets `(from, to)`.
    pub range: Option<(usize, usize)>,
    pub date_gte: Option<NaiveDate>,
    pub date_lte: Option<NaiveDate>,
}

impl TableQuery {
    pub fn latest(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            date_gte: Some(from),
            date_lte: Some(to),
            ..Self::default()
        }
    }

    /// Same filters, restricted to one page of rows.
    pub fn page(&self, offset: usize, page_size: usize) -> Self {
        Self {
            limit: None,
            range: Some((offset, offset + page_size.saturating_sub(1))),
            ..self.clone()
        }
    }
}

/// Conflict handling for keyed writes (conflict target: `date`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Replace existing rows.
    #[default]
    Merge,
    /// Only fill dates that are missing; existing rows are kept.
    FillGaps,
}

/// Row store reachable over a query/update API.
pub trait RemoteTable: Send + Sync {
    /// Rows one read returns at most.
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    fn fetch(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> impl Future<Output = Result<Vec<PricePoint>>> + Send;

    fn upsert(
        &self,
        table: &str,
        rows: &[PricePoint],
        mode: WriteMode,
    ) -> impl Future<Output = Result<()>> + Send;
}
