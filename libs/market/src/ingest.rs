//! Scheduled ingestion: pull daily history from the public market-data API,
//! derive indicators and write rows keyed on date.

use anyhow::Error;
use chrono::{DateTime, Utc};
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue},
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::asset::Asset;
use crate::error::{MarketError, Result};
use crate::indicators;
use crate::point::PricePoint;
use crate::remote::{RemoteTable, WriteMode};
use crate::series::SeriesStore;

pub const DEFAULT_API_BASE: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    /// History requested per run; enough for the longest indicator window.
    pub days: u32,
    /// Trailing rows written per run.
    pub tail: usize,
    pub mode: WriteMode,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            days: 365,
            tail: 30,
            mode: WriteMode::Merge,
        }
    }
}

impl IngestConfig {
    /// Every variable is optional: COINGECKO_API_BASE, COINGECKO_KEY,
    /// INGEST_DAYS, INGEST_TAIL.
    pub fn from_env() -> Result<Self, Error> {
        use std::env;

        let mut config = Self::default();
        if let Ok(base) = env::var("COINGECKO_API_BASE") {
            config.api_base = base;
        }
        config.api_key = env::var("COINGECKO_KEY").ok().filter(|k| !k.is_empty());
        if let Ok(days) = env::var("INGEST_DAYS") {
            config.days = days.parse()?;
        }
        if let Ok(tail) = env::var("INGEST_TAIL") {
            config.tail = tail.parse()?;
        }
        Ok(config)
    }
}

//
// Match CoinGecko market_chart JSON
// https://docs.coingecko.com/reference/coins-id-market-chart
//
#[derive(Debug, Deserialize, Clone)]
pub struct MarketChart {
    /// `[timestamp_ms, price]`
    pub prices: Vec<(f64, f64)>,
    /// `[timestamp_ms, volume]`, parallel to `prices`.
    #[serde(default)]
    pub total_volumes: Vec<(f64, f64)>,
}

#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_api: String,
}

impl CoinGeckoClient {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            headers.insert(
                "x-cg-demo-api-key",
                HeaderValue::from_str(key).map_err(|e| MarketError::InvalidConfig(e.to_string()))?,
            );
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_api: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    #[instrument(skip(self), fields(asset = %asset))]
    pub async fn market_chart(&self, asset: Asset, days: u32) -> Result<MarketChart> {
        let url = format!("{}/coins/{}/market_chart", self.base_api, asset.coingecko_id());

        let res = self
            .client
            .get(url)
            .query(&[
                ("vs_currency", "usd"),
                ("days", &days.to_string()),
                ("interval", "daily"),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(MarketError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let chart: MarketChart =
            serde_json::from_str(&body).map_err(|e| MarketError::Malformed(e.to_string()))?;
        debug!(prices = chart.prices.len(), "fetched market chart");
        Ok(chart)
    }
}

/// Turn a market chart into persisted rows: one per UTC day (last sample
/// wins), indicators derived over the whole chart, rounded, trailing `tail`.
pub fn build_rows(chart: &MarketChart, tail: usize) -> Vec<PricePoint> {
    let points = chart.prices.iter().enumerate().filter_map(|(i, &(ts, price))| {
        let date = DateTime::<Utc>::from_timestamp_millis(ts as i64)?.date_naive();
        let volume = chart.total_volumes.get(i).map_or(0.0, |&(_, v)| v);
        Some(PricePoint::from_close(date, price, volume))
    });

    let mut rows = SeriesStore::from_points(points).into_points();
    indicators::enrich(&mut rows);

    let skip = rows.len().saturating_sub(tail);
    rows.into_iter().skip(skip).map(|p| p.rounded()).collect()
}

/// Fetch, derive and write one asset. Returns the number of rows written.
#[instrument(skip(client, remote, config), fields(asset = %asset))]
pub async fn ingest_asset<R: RemoteTable>(
    client: &CoinGeckoClient,
    remote: &R,
    asset: Asset,
    config: &IngestConfig,
) -> Result<usize> {
    let chart = client.market_chart(asset, config.days).await?;
    let rows = build_rows(&chart, config.tail);

    remote.upsert(asset.table(), &rows, config.mode).await?;
    info!(rows = rows.len(), mode = ?config.mode, "ingested");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const DAY_MS: f64 = 86_400_000.0;
    // 2024-01-01T00:00:00Z
    const START_MS: f64 = 1_704_067_200_000.0;

    fn chart(closes: &[f64]) -> MarketChart {
        MarketChart {
            prices: closes
                .iter()
                .enumerate()
                .map(|(i, &c)| (START_MS + i as f64 * DAY_MS, c))
                .collect(),
            total_volumes: closes
                .iter()
                .enumerate()
                .map(|(i, _)| (START_MS + i as f64 * DAY_MS, 1_000.0 + i as f64))
                .collect(),
        }
    }

    #[test]
    fn parses_api_payload() {
        let raw = r#"{"prices": [[1704067200000, 42000.5]], "total_volumes": [[1704067200000, 9.5]], "market_caps": []}"#;
        let chart: MarketChart = serde_json::from_str(raw).unwrap();
        let rows = build_rows(&chart, 30);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(rows[0].open, 42000.5);
        assert_eq!(rows[0].volume, 10.0);
    }

    #[test]
    fn keeps_tail_with_full_history_indicators() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + f64::from(i)).collect();
        let rows = build_rows(&chart(&closes), 10);

        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 2, 20).unwrap());
        // sma_50 needs history from before the tail
        assert!(rows.iter().all(|p| p.sma_50.is_some()));
        assert_eq!(rows.last().unwrap().rsi_14, Some(100.0));
        assert_eq!(rows.last().unwrap().drawdown_pct, Some(0.0));
    }

    #[test]
    fn intraday_sample_replaces_same_day() {
        let mut c = chart(&[10.0, 11.0]);
        // a "now" sample later on the second day
        c.prices.push((START_MS + DAY_MS + 3_600_000.0, 12.0));
        let rows = build_rows(&c, 30);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].close, 12.0);
        assert_eq!(rows[1].volume, 0.0);
    }

    #[test]
    fn matches_client_side_recomputation() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + (f64::from(i) * 0.7).sin() * 3.0).collect();
        let persisted = build_rows(&chart(&closes), 40);

        let mut client_side = SeriesStore::from_points(chart_points(&closes)).into_points();
        indicators::enrich(&mut client_side);
        let client_side: Vec<PricePoint> = client_side.iter().map(PricePoint::rounded).collect();

        assert_eq!(persisted, client_side);
    }

    fn chart_points(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PricePoint::from_close(start + chrono::Duration::days(i as i64), c, 1_000.0 + i as f64)
            })
            .collect()
    }
}
