/// Percent below the running maximum close, point by point (always ≤ 0).
pub fn drawdown(prices: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    prices
        .iter()
        .map(|&close| {
            peak = peak.max(close);
            if peak > 0.0 {
                (close - peak) / peak * 100.0
            } else {
                0.0
            }
        })
        .collect()
}
