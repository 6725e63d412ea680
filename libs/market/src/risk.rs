use crate::point::PricePoint;

pub const TRADING_DAYS_PER_YEAR: f64 = 365.0;
pub const VAR_PERCENTILE: f64 = 0.05;
pub const DEFAULT_HISTOGRAM_BINS: usize = 25;

/// Risk statistics over one window of a series. Returns are in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskSnapshot {
    pub volatility: f64,
    pub annualized_volatility: f64,
    pub max_drawdown: f64,
    pub current_drawdown: f64,
    /// 5th-percentile daily return: a loss estimate, usually negative.
    pub var_95: f64,
    pub positive_days: usize,
    pub negative_days: usize,
    pub avg_positive: f64,
    pub avg_negative: f64,
    pub best_day: f64,
    pub worst_day: f64,
    pub total_days: usize,
}

/// Day-over-day percent changes of the window's closes.
pub fn daily_returns(points: &[PricePoint]) -> Vec<f64> {
    points
        .windows(2)
        .map(|w| (w[1].close - w[0].close) / w[0].close * 100.0)
        .collect()
}

/// `None` when the window holds fewer than two points.
pub fn snapshot(points: &[PricePoint]) -> Option<RiskSnapshot> {
    if points.len() < 2 {
        return None;
    }

    let returns = daily_returns(points);
    let count = returns.len() as f64;

    let mean = returns.iter().sum::<f64>() / count;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / count;
    let volatility = variance.sqrt();

    let max_drawdown = points
        .iter()
        .map(|p| p.drawdown_pct.unwrap_or(0.0))
        .fold(0.0, f64::min);
    let current_drawdown = points
        .last()
        .and_then(|p| p.drawdown_pct)
        .unwrap_or(0.0);

    let (positive, negative): (Vec<f64>, Vec<f64>) = returns.iter().partition(|&&r| r >= 0.0);

    Some(RiskSnapshot {
        volatility,
        annualized_volatility: volatility * TRADING_DAYS_PER_YEAR.sqrt(),
        max_drawdown,
        current_drawdown,
        var_95: value_at_risk(&returns, VAR_PERCENTILE).unwrap_or(0.0),
        positive_days: positive.len(),
        negative_days: negative.len(),
        avg_positive: mean_or_zero(&positive),
        avg_negative: mean_or_zero(&negative),
        best_day: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        worst_day: returns.iter().copied().fold(f64::INFINITY, f64::min),
        total_days: returns.len(),
    })
}

/// Value of the ascending-sorted returns at index `floor(percentile * count)`.
pub fn value_at_risk(returns: &[f64], percentile: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = ((percentile * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    Some(sorted[idx])
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`; half-open except the closed last bin.
pub fn histogram(returns: &[f64], bins: usize) -> Vec<HistogramBin> {
    if returns.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = returns.iter().copied().fold(f64::INFINITY, f64::min);
    let max = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    (0..bins)
        .map(|i| {
            let last = i + 1 == bins;
            let start = min + i as f64 * width;
            let end = if last { max } else { min + (i + 1) as f64 * width };
            let count = returns
                .iter()
                .filter(|&&r| r >= start && (r < end || (last && r <= end)))
                .count();
            HistogramBin { start, end, count }
        })
        .collect()
}
