use crate::point::PricePoint;

pub const FIB_RATIOS: [f64; 4] = [0.236, 0.382, 0.5, 0.618];

#[derive(Debug, Clone, PartialEq)]
pub struct FibLevel {
    /// Retracement from the high, 0.0 = high, 1.0 = low.
    pub ratio: f64,
    pub price: f64,
}

/// Retracement levels between the window's highest and lowest close.
pub fn fibonacci(points: &[PricePoint]) -> Option<Vec<FibLevel>> {
    let first = points.first()?;
    let (min, max) = points
        .iter()
        .fold((first.close, first.close), |(lo, hi), p| (lo.min(p.close), hi.max(p.close)));
    let diff = max - min;

    let mut levels = Vec::with_capacity(FIB_RATIOS.len() + 2);
    levels.push(FibLevel { ratio: 0.0, price: max });
    levels.extend(FIB_RATIOS.iter().map(|&ratio| FibLevel {
        ratio,
        price: max - ratio * diff,
    }));
    levels.push(FibLevel { ratio: 1.0, price: min });
    Some(levels)
}
