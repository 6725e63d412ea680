//! Causal technical indicators.
//!
//! Every function reads a prefix of history and never looks ahead; short
//! history yields `None` rather than an error.

mod bollinger;
mod drawdown;
mod levels;
mod macd;
mod moving_average;
mod rsi;
mod volume;

pub use bollinger::{Bands, bollinger};
pub use drawdown::drawdown;
pub use levels::{FIB_RATIOS, FibLevel, fibonacci};
pub use macd::{Macd, macd};
pub use moving_average::{ema, sma};
pub use rsi::{RsiStatus, rsi};
pub use volume::{DEFAULT_PROFILE_BUCKETS, ProfileBucket, obv, volume_profile};

use crate::point::PricePoint;

pub const SMA_SHORT: usize = 50;
pub const SMA_LONG: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const BB_PERIOD: usize = 20;
pub const BB_K: f64 = 2.0;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Recompute every derived field of a date-ordered series in place.
///
/// Shared by the ingestion job and client-side recomputation so both sides
/// persist identical values. Values stay at full precision; round with
/// [`PricePoint::rounded`] before writing.
pub fn enrich(points: &mut [PricePoint]) {
    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    let macd_values = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let obv_values = obv(points);
    let drawdowns = drawdown(&closes);

    for (i, point) in points.iter_mut().enumerate() {
        let prefix = &closes[..=i];
        let bands = bollinger(prefix, BB_PERIOD, BB_K);

        point.sma_50 = sma(prefix, SMA_SHORT);
        point.sma_200 = sma(prefix, SMA_LONG);
        point.rsi_14 = rsi(prefix, RSI_PERIOD);
        point.bb_upper = bands.map(|b| b.upper);
        point.bb_lower = bands.map(|b| b.lower);
        point.macd = macd_values[i].map(|m| m.macd);
        point.macd_signal = macd_values[i].map(|m| m.signal);
        point.obv = Some(obv_values[i]);
        point.drawdown_pct = Some(drawdowns[i]);
    }
}
