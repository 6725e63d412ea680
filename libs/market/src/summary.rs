use std::fmt;

use crate::asset::Asset;
use crate::series::SeriesStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    /// Bullish only above a known long-term average.
    pub fn from_sma(price: f64, sma_200: Option<f64>) -> Self {
        match sma_200 {
            Some(sma) if price > sma => Trend::Bullish,
            _ => Trend::Bearish,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => f.write_str("bullish"),
            Trend::Bearish => f.write_str("bearish"),
        }
    }
}

/// Headline numbers for the latest point of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpi {
    pub price: f64,
    pub price_change: f64,
    pub price_change_pct: f64,
    pub rsi: f64,
    pub drawdown: f64,
    pub trend: Trend,
    pub sma_50: f64,
    pub sma_200: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
}

impl Kpi {
    pub fn from_series(series: &SeriesStore) -> Option<Self> {
        let latest = series.latest()?;
        let (price_change, price_change_pct) = match series.previous() {
            Some(prev) if prev.close != 0.0 => (
                latest.close - prev.close,
                (latest.close - prev.close) / prev.close * 100.0,
            ),
            _ => (0.0, 0.0),
        };

        Some(Self {
            price: latest.close,
            price_change,
            price_change_pct,
            rsi: latest.rsi_14.unwrap_or(50.0),
            drawdown: latest.drawdown_pct.unwrap_or(0.0),
            trend: Trend::from_sma(latest.close, latest.sma_200),
            sma_50: latest.sma_50.unwrap_or(latest.close),
            sma_200: latest.sma_200.unwrap_or(latest.close),
            bb_upper: latest.bb_upper.unwrap_or(latest.close),
            bb_lower: latest.bb_lower.unwrap_or(latest.close),
        })
    }
}

/// One row of the cross-asset market scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRow {
    pub asset: Asset,
    pub price: f64,
    pub change_24h: f64,
    pub change_7d: f64,
    pub volume: f64,
    pub rsi: f64,
    pub sma_200: f64,
    pub trend: Trend,
    pub ath: f64,
    pub drawdown: f64,
}

impl ScanRow {
    pub fn from_series(asset: Asset, series: &SeriesStore) -> Self {
        let points = series.window_all();
        let Some(latest) = points.last() else {
            return Self {
                asset,
                price: 0.0,
                change_24h: 0.0,
                change_7d: 0.0,
                volume: 0.0,
                rsi: 0.0,
                sma_200: 0.0,
                trend: Trend::Bearish,
                ath: 0.0,
                drawdown: 0.0,
            };
        };

        let back = |n: usize| points.len().checked_sub(n + 1).map_or(latest, |i| &points[i]);
        let change = |from: f64| {
            if from != 0.0 {
                (latest.close - from) / from * 100.0
            } else {
                0.0
            }
        };

        let price = latest.close;
        let ath = points.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
        let sma_200 = latest.sma_200.unwrap_or(price);

        Self {
            asset,
            price,
            change_24h: change(back(1).close),
            change_7d: change(back(7).close),
            volume: latest.volume,
            rsi: latest.rsi_14.unwrap_or(50.0),
            sma_200,
            trend: if price > sma_200 { Trend::Bullish } else { Trend::Bearish },
            ath,
            drawdown: if ath > 0.0 { (price - ath) / ath * 100.0 } else { 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::PricePoint;
    use chrono::{Duration, NaiveDate};

    fn store(closes: &[f64]) -> SeriesStore {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        SeriesStore::from_points(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| PricePoint::from_close(start + Duration::days(i as i64), c, 5.0)),
        )
    }

    #[test]
    fn kpi_defaults_when_indicators_missing() {
        let kpi = Kpi::from_series(&store(&[100.0, 90.0])).unwrap();
        assert_eq!(kpi.price, 90.0);
        assert_eq!(kpi.price_change, -10.0);
        assert!((kpi.price_change_pct + 10.0).abs() < 1e-12);
        assert_eq!(kpi.rsi, 50.0);
        assert_eq!(kpi.trend, Trend::Bearish);
        assert_eq!(kpi.sma_200, 90.0);

        assert!(Kpi::from_series(&SeriesStore::new()).is_none());
        let single = Kpi::from_series(&store(&[7.0])).unwrap();
        assert_eq!(single.price_change, 0.0);
    }

    #[test]
    fn trend_needs_sma() {
        assert_eq!(Trend::from_sma(10.0, None), Trend::Bearish);
        assert_eq!(Trend::from_sma(10.0, Some(9.0)), Trend::Bullish);
        assert_eq!(Trend::from_sma(10.0, Some(10.0)), Trend::Bearish);
    }

    #[test]
    fn scan_row_changes() {
        let closes: Vec<f64> = (1..=10).map(|i| f64::from(i) * 10.0).collect();
        let row = ScanRow::from_series(Asset::Btc, &store(&closes));
        assert_eq!(row.price, 100.0);
        assert!((row.change_24h - (100.0 - 90.0) / 90.0 * 100.0).abs() < 1e-12);
        // 8th from last is 30
        assert!((row.change_7d - (100.0 - 30.0) / 30.0 * 100.0).abs() < 1e-12);
        assert_eq!(row.ath, 100.0);
        assert_eq!(row.drawdown, 0.0);
        assert_eq!(row.volume, 5.0);
    }

    #[test]
    fn scan_row_short_and_empty() {
        let row = ScanRow::from_series(Asset::Eth, &store(&[4.0, 5.0]));
        assert_eq!(row.change_7d, 0.0);

        let empty = ScanRow::from_series(Asset::Sol, &SeriesStore::new());
        assert_eq!(empty.price, 0.0);
        assert_eq!(empty.trend, Trend::Bearish);
    }
}
