use chrono::NaiveDate;

use crate::asset::Asset;
use crate::point::PricePoint;

/// Pearson coefficient; 0 for mismatched, empty or constant inputs.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n == 0 || n != y.len() {
        return 0.0;
    }

    let nf = n as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|b| b * b).sum();

    let numerator = nf * sum_xy - sum_x * sum_y;
    let denominator = ((nf * sum_x2 - sum_x * sum_x) * (nf * sum_y2 - sum_y * sum_y)).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    (numerator / denominator).clamp(-1.0, 1.0)
}

/// Trailing `min(len_a, len_b)` points of each side, most recent aligned.
pub fn align<'a>(a: &'a [PricePoint], b: &'a [PricePoint]) -> (&'a [PricePoint], &'a [PricePoint]) {
    let n = a.len().min(b.len());
    (&a[a.len() - n..], &b[b.len() - n..])
}

/// Correlation of closes after trailing alignment.
pub fn correlate(a: &[PricePoint], b: &[PricePoint]) -> f64 {
    let (a, b) = align(a, b);
    let xs: Vec<f64> = a.iter().map(|p| p.close).collect();
    let ys: Vec<f64> = b.iter().map(|p| p.close).collect();
    pearson(&xs, &ys)
}

/// Symmetric matrix with a unit diagonal, rows and columns in `assets` order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub assets: Vec<Asset>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn build(series: &[(Asset, &[PricePoint])]) -> Self {
        let n = series.len();
        let mut values = vec![vec![0.0; n]; n];

        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let r = correlate(series[i].1, series[j].1);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Self {
            assets: series.iter().map(|(asset, _)| *asset).collect(),
            values,
        }
    }

    pub fn get(&self, row: Asset, col: Asset) -> Option<f64> {
        let i = self.assets.iter().position(|a| *a == row)?;
        let j = self.assets.iter().position(|a| *a == col)?;
        Some(self.values[i][j])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatioPoint {
    pub date: NaiveDate,
    pub ratio: f64,
    pub base_price: f64,
    pub quote_price: f64,
}

/// `base.close / quote.close` per aligned point. Zero quotes are skipped.
pub fn ratio_series(base: &[PricePoint], quote: &[PricePoint]) -> Vec<RatioPoint> {
    let (base, quote) = align(base, quote);
    base.iter()
        .zip(quote)
        .filter(|(_, q)| q.close != 0.0)
        .map(|(b, q)| RatioPoint {
            date: b.date,
            ratio: b.close / q.close,
            base_price: b.close,
            quote_price: q.close,
        })
        .collect()
}

/// Paired daily returns in percent: `x` is the quote, `y` the base.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub date: NaiveDate,
    pub x: f64,
    pub y: f64,
}

pub fn scatter_series(base: &[PricePoint], quote: &[PricePoint]) -> Vec<ScatterPoint> {
    let (base, quote) = align(base, quote);
    base.windows(2)
        .zip(quote.windows(2))
        .map(|(b, q)| ScatterPoint {
            date: b[1].date,
            x: (q[1].close - q[0].close) / q[0].close * 100.0,
            y: (b[1].close - b[0].close) / b[0].close * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn series(closes: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::from_close(start + Duration::days(i as i64), c, 0.0))
            .collect()
    }

    #[test]
    fn self_correlation_is_one() {
        let a = [1.0, 3.0, 2.0, 5.0, 4.0];
        assert!((pearson(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_correlation() {
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 2.0, 1.0];
        assert!((pearson(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_are_zero() {
        assert_eq!(pearson(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(pearson(&[], &[]), 0.0);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let btc = series(&[10.0, 12.0, 11.0, 15.0, 14.0, 16.0]);
        let eth = series(&[1.0, 1.1, 1.3, 1.2]);
        let flat = series(&[7.0; 5]);
        let m = CorrelationMatrix::build(&[
            (Asset::Btc, btc.as_slice()),
            (Asset::Eth, eth.as_slice()),
            (Asset::Sol, flat.as_slice()),
        ]);

        for i in 0..3 {
            assert_eq!(m.values[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(m.values[i][j], m.values[j][i]);
                assert!((-1.0..=1.0).contains(&m.values[i][j]));
            }
        }
        assert_eq!(m.get(Asset::Sol, Asset::Btc), Some(0.0));
        assert_eq!(m.get(Asset::Xrp, Asset::Btc), None);
    }

    #[test]
    fn alignment_uses_most_recent_points() {
        let long = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let short = series(&[10.0, 20.0]);
        let (a, b) = align(&long, &short);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].close, 4.0);
        assert_eq!(b[1].close, 20.0);
    }

    #[test]
    fn ratio_and_scatter() {
        let base = series(&[10.0, 20.0, 30.0]);
        let quote = series(&[5.0, 5.0, 10.0]);

        let ratio = ratio_series(&base, &quote);
        assert_eq!(ratio.len(), 3);
        assert_eq!(ratio[1].ratio, 4.0);
        assert_eq!(ratio[2].quote_price, 10.0);

        let scatter = scatter_series(&base, &quote);
        assert_eq!(scatter.len(), 2);
        assert_eq!(scatter[0].date, base[1].date);
        assert_eq!(scatter[0].x, 0.0);
        assert_eq!(scatter[0].y, 100.0);
        assert_eq!(scatter[1].x, 100.0);
        assert_eq!(scatter[1].y, 50.0);
    }
}
