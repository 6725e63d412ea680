use ta::Next;
use ta::indicators::ExponentialMovingAverage;

/// Mean of the last `period` values, or `None` on short history.
pub fn sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// EMA for every index, seeded with the first value (`k = 2 / (period + 1)`).
///
/// Returns an empty series for an empty input or a zero period.
pub fn ema(prices: &[f64], period: usize) -> Vec<f64> {
    let Ok(mut ema) = ExponentialMovingAverage::new(period) else {
        return Vec::new();
    };
    prices.iter().map(|&x| ema.next(x)).collect()
}
