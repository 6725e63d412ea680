use super::moving_average::sma;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// SMA(period) ± `k` population standard deviations of the last `period` values.
pub fn bollinger(prices: &[f64], period: usize, k: f64) -> Option<Bands> {
    let middle = sma(prices, period)?;
    let window = &prices[prices.len() - period..];
    let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
    let std = variance.sqrt();

    Some(Bands {
        upper: middle + k * std,
        middle,
        lower: middle - k * std,
    })
}
