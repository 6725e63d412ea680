use super::moving_average::ema;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD aligned index-for-index with `prices`.
///
/// The first `slow` entries are `None`: the slow EMA has not settled there.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Vec<Option<Macd>> {
    let fast_line = ema(prices, fast);
    let slow_line = ema(prices, slow);

    if fast_line.len() != prices.len() || slow_line.len() != prices.len() {
        return vec![None; prices.len()];
    }

    let macd_line: Vec<f64> = fast_line
        .iter()
        .zip(&slow_line)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal);
    if signal_line.len() != macd_line.len() {
        return vec![None; prices.len()];
    }

    macd_line
        .iter()
        .zip(&signal_line)
        .enumerate()
        .map(|(i, (&m, &s))| {
            (i >= slow).then_some(Macd {
                macd: m,
                signal: s,
                histogram: m - s,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unstable_prefix_is_excluded() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + f64::from(i)).collect();
        let out = macd(&prices, 12, 26, 9);
        assert_eq!(out.len(), 40);
        assert!(out[..26].iter().all(Option::is_none));
        assert!(out[26..].iter().all(Option::is_some));
    }

    #[test]
    fn short_series_has_no_values() {
        let out = macd(&[1.0; 20], 12, 26, 9);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn constant_series_is_flat() {
        let out = macd(&[50.0; 30], 12, 26, 9);
        let last = out[29].unwrap();
        assert!(last.macd.abs() < 1e-12);
        assert!(last.signal.abs() < 1e-12);
        assert!(last.histogram.abs() < 1e-12);
    }

    #[test]
    fn rising_series_has_positive_macd() {
        let prices: Vec<f64> = (0..60).map(|i| 10.0 + 0.5 * f64::from(i)).collect();
        let last = macd(&prices, 12, 26, 9)[59].unwrap();
        assert!(last.macd > 0.0);
        assert!((last.histogram - (last.macd - last.signal)).abs() < 1e-12);
    }

    #[test]
    fn is_causal() {
        let prices: Vec<f64> = (0..50).map(|i| (f64::from(i) * 0.3).sin() * 10.0 + 100.0).collect();
        let full = macd(&prices, 12, 26, 9);
        let prefix = macd(&prices[..35], 12, 26, 9);
        assert_eq!(&full[..35], &prefix[..]);
    }
}
