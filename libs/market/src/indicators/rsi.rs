/// Relative strength index over the trailing `period` deltas.
///
/// Gains and losses are simple averages recomputed from scratch on each
/// call, not Wilder-smoothed. A window without losses reads exactly 100.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0, 0.0), |(g, l), diff| {
            if diff > 0.0 {
                (g + diff, l)
            } else {
                (g, l - diff)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiStatus {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiStatus {
    pub fn classify(rsi: f64) -> Self {
        if rsi >= 70.0 {
            RsiStatus::Overbought
        } else if rsi <= 30.0 {
            RsiStatus::Oversold
        } else {
            RsiStatus::Neutral
        }
    }
}
