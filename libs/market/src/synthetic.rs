//! Locally generated stand-in history, used when the remote store is
//! unreachable. Deterministic per `(asset, days, end)` and never authoritative.

use chrono::{Datelike, Duration, NaiveDate};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::asset::Asset;
use crate::indicators;
use crate::point::PricePoint;

const DAILY_VOLATILITY: f64 = 0.03;
const BASE_VOLUME: f64 = 30_000_000_000.0;

fn seed(asset: Asset, days: usize, end: NaiveDate) -> u64 {
    let tag = asset
        .symbol()
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
    tag ^ (days as u64).rotate_left(17) ^ (end.num_days_from_ce() as u64).rotate_left(33)
}

/// `days` consecutive daily points ending at `end`, with derived fields filled.
pub fn generate(asset: Asset, days: usize, end: NaiveDate) -> Vec<PricePoint> {
    let mut rng = StdRng::seed_from_u64(seed(asset, days, end));

    let base = asset.reference_price();
    let (floor, cap) = (base * 0.22, base * 2.2);
    let mut price = base;

    let mut points: Vec<PricePoint> = (0..days)
        .map(|i| {
            let date = end - Duration::days((days - 1 - i) as i64);

            let trend = ((i + 1) as f64 / 30.0).sin() * 0.001;
            let walk = rng.gen_range(-1.0..1.0) * DAILY_VOLATILITY;
            price = (price * (1.0 + trend + walk)).clamp(floor, cap);

            let spread = price * DAILY_VOLATILITY * 0.5;
            let open = price * (1.0 + rng.gen_range(-0.01..0.01));
            let high = price.max(open) + rng.gen_range(0.0..1.0) * spread;
            let low = price.min(open) - rng.gen_range(0.0..1.0) * spread;
            let volume = BASE_VOLUME * (1.0 + rng.gen_range(-0.5..0.5));

            PricePoint {
                open,
                high,
                low,
                ..PricePoint::from_close(date, price, volume)
            }
        })
        .collect();

    indicators::enrich(&mut points);
    points.iter().map(PricePoint::rounded).collect()
}
