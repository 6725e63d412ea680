use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use futures_util::future::join_all;
use market::correlation::{CorrelationMatrix, ratio_series};
use market::indicators::{DEFAULT_PROFILE_BUCKETS, RsiStatus, fibonacci, volume_profile};
use market::risk;
use market::summary::{Kpi, ScanRow};
use market::sync::DataSource;
use market::{Asset, LoadRequest, SeriesStore, SeriesSync};
use sentinel::Services;

use tracing::{debug, info, instrument, warn};
use tracing_futures::Instrument;

/// Rows older than this are reported as stale.
const STALE_AFTER_DAYS: i64 = 2;

#[instrument(
    name = "run_report",
    skip(services, assets),
    fields(assets = assets.len())
)]
pub async fn run_report(
    services: Arc<Services>,
    assets: Vec<Asset>,
    report_days: usize,
    correlation_days: usize,
) -> Result<()> {
    let loaded = join_all(assets.iter().map(|&asset| {
        let sync = SeriesSync::new(asset, services.remote.clone());
        let span = tracing::info_span!("report_load", asset = %asset);

        async move {
            match sync.load(LoadRequest::Trailing(report_days)).await {
                Ok(outcome) => {
                    if outcome.source == DataSource::Synthetic {
                        warn!(error = ?outcome.error, "report uses synthetic series");
                    }
                    Some((asset, sync.snapshot()))
                }
                Err(e) => {
                    warn!(error = %e, "report load failed");
                    None
                }
            }
        }
        .instrument(span)
    }))
    .await;
    let series: Vec<(Asset, SeriesStore)> = loaded.into_iter().flatten().collect();

    let today = Utc::now().date_naive();
    for (asset, store) in &series {
        report_asset(*asset, store);

        if let Some(latest) = store.latest()
            && (today - latest.date).num_days() > STALE_AFTER_DAYS
        {
            warn!(asset = %asset, last = %latest.date, "series is stale");
        }
    }

    let windows: Vec<(Asset, &[market::PricePoint])> = series
        .iter()
        .map(|(asset, store)| (*asset, store.window_trailing(correlation_days)))
        .collect();
    let matrix = CorrelationMatrix::build(&windows);
    for (i, row) in matrix.assets.iter().enumerate() {
        for (j, col) in matrix.assets.iter().enumerate().skip(i + 1) {
            info!(pair = %format!("{row}/{col}"), r = matrix.values[i][j], "correlation");
        }
    }

    if let (Some((_, btc)), Some((_, eth))) = (
        windows.iter().find(|(a, _)| *a == Asset::Btc),
        windows.iter().find(|(a, _)| *a == Asset::Eth),
    ) && let Some(last) = ratio_series(btc, eth).last()
    {
        info!(date = %last.date, ratio = last.ratio, "BTC/ETH ratio");
    }

    info!(series = series.len(), "completed market report");
    Ok(())
}

fn report_asset(asset: Asset, store: &SeriesStore) {
    let row = ScanRow::from_series(asset, store);
    info!(
        asset = %asset,
        price = row.price,
        change_24h = row.change_24h,
        change_7d = row.change_7d,
        volume = row.volume,
        trend = %row.trend,
        ath = row.ath,
        drawdown = row.drawdown,
        "scan"
    );

    let Some(kpi) = Kpi::from_series(store) else {
        debug!(asset = %asset, "empty series");
        return;
    };
    info!(
        asset = %asset,
        rsi = kpi.rsi,
        status = ?RsiStatus::classify(kpi.rsi),
        sma_50 = kpi.sma_50,
        sma_200 = kpi.sma_200,
        bb_upper = kpi.bb_upper,
        bb_lower = kpi.bb_lower,
        "kpi"
    );

    match risk::snapshot(store.window_all()) {
        Some(r) => info!(
            asset = %asset,
            volatility = r.volatility,
            annualized = r.annualized_volatility,
            max_drawdown = r.max_drawdown,
            var_95 = r.var_95,
            positive_days = r.positive_days,
            negative_days = r.negative_days,
            best_day = r.best_day,
            worst_day = r.worst_day,
            "risk"
        ),
        None => debug!(asset = %asset, "not enough history for risk"),
    }

    let poc = volume_profile(store.window_all(), DEFAULT_PROFILE_BUCKETS)
        .into_iter()
        .find(|b| b.is_poc);
    let levels = fibonacci(store.window_all()).unwrap_or_default();
    let support = levels
        .iter()
        .map(|l| l.price)
        .filter(|&p| p <= kpi.price)
        .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.max(p))));
    info!(
        asset = %asset,
        poc = poc.map(|b| b.mid()),
        fib_support = support,
        "levels"
    );
}
