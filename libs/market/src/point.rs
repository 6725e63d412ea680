use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day of one asset, matching the remote table row.
///
/// Derived fields stay `None` until enough history exists to compute them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,

    #[serde(default)]
    pub sma_50: Option<f64>,
    #[serde(default)]
    pub sma_200: Option<f64>,
    #[serde(default, rename = "rsi", alias = "rsi_14")]
    pub rsi_14: Option<f64>,
    #[serde(default)]
    pub bb_upper: Option<f64>,
    #[serde(default)]
    pub bb_lower: Option<f64>,
    #[serde(default)]
    pub macd: Option<f64>,
    #[serde(default)]
    pub macd_signal: Option<f64>,
    #[serde(default)]
    pub obv: Option<f64>,
    #[serde(default)]
    pub drawdown_pct: Option<f64>,
}

impl PricePoint {
    /// A point whose open/high/low are approximated by the close.
    pub fn from_close(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self {
            id: None,
            date,
            close,
            open: close,
            high: close,
            low: close,
            volume: volume.max(0.0),
            sma_50: None,
            sma_200: None,
            rsi_14: None,
            bb_upper: None,
            bb_lower: None,
            macd: None,
            macd_signal: None,
            obv: None,
            drawdown_pct: None,
        }
    }

    /// Copy with monetary and derived values rounded to cents, as persisted.
    pub fn rounded(&self) -> Self {
        let r = |v: Option<f64>| v.map(round2);
        Self {
            id: self.id,
            date: self.date,
            close: round2(self.close),
            open: round2(self.open),
            high: round2(self.high),
            low: round2(self.low),
            volume: self.volume.round(),
            sma_50: r(self.sma_50),
            sma_200: r(self.sma_200),
            rsi_14: r(self.rsi_14),
            bb_upper: r(self.bb_upper),
            bb_lower: r(self.bb_lower),
            macd: r(self.macd),
            macd_signal: r(self.macd_signal),
            obv: self.obv.map(f64::round),
            drawdown_pct: r(self.drawdown_pct),
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
