use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

use crate::asset::Asset;
use crate::remote::{RemoteTable, TableQuery};

#[derive(Debug, Clone, PartialEq)]
pub struct TickerItem {
    pub asset: Asset,
    pub price: f64,
    pub change_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Published { tick: u64, items: usize },
    /// A newer tick started before this one finished.
    Discarded { tick: u64 },
}

/// Latest price and day change per asset, refreshed by polling.
pub struct Ticker<R> {
    remote: R,
    assets: Vec<Asset>,
    started: AtomicU64,
    board: RwLock<Vec<TickerItem>>,
}

impl<R: RemoteTable> Ticker<R> {
    pub fn new(remote: R, assets: Vec<Asset>) -> Self {
        Self {
            remote,
            assets,
            started: AtomicU64::new(0),
            board: RwLock::new(Vec::new()),
        }
    }

    /// Last published board.
    pub fn items(&self) -> Vec<TickerItem> {
        self.board
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[instrument(name = "ticker_poll", skip(self))]
    pub async fn poll(&self) -> TickOutcome {
        let tick = self.started.fetch_add(1, Ordering::SeqCst) + 1;

        let results = join_all(self.assets.iter().map(|&asset| async move {
            match self.remote.fetch(asset.table(), &TableQuery::latest(2)).await {
                Ok(rows) => ticker_item(asset, &rows),
                Err(e) => {
                    warn!(asset = %asset, error = %e, "ticker fetch failed");
                    None
                }
            }
        }))
        .await;
        let items: Vec<TickerItem> = results.into_iter().flatten().collect();

        let mut board = self.board.write().unwrap_or_else(PoisonError::into_inner);
        if self.started.load(Ordering::SeqCst) != tick {
            debug!(tick, "newer tick in flight, discarding");
            return TickOutcome::Discarded { tick };
        }

        let count = items.len();
        *board = items;
        debug!(tick, items = count, "ticker published");
        TickOutcome::Published { tick, items: count }
    }
}

impl<R: RemoteTable + 'static> Ticker<R> {
    /// Poll every `every` forever. Ticks run concurrently; a slow tick that
    /// is overtaken is discarded.
    pub async fn run(self: Arc<Self>, every: Duration) {
        let mut tick = interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(every_secs = every.as_secs(), "ticker started");

        loop {
            tick.tick().await;
            let this = Arc::clone(&self);
            tokio::spawn(async move {
                this.poll().await;
            });
        }
    }
}

/// Rows come newest first; a lone row reads as unchanged.
fn ticker_item(asset: Asset, rows: &[crate::point::PricePoint]) -> Option<TickerItem> {
    let current = rows.first()?;
    let prev = rows.get(1).unwrap_or(current);
    let change_pct = if prev.close != 0.0 {
        (current.close - prev.close) / prev.close * 100.0
    } else {
        0.0
    };

    Some(TickerItem {
        asset,
        price: current.close,
        change_pct,
    })
}
