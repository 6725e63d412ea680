use crate::point::PricePoint;

/// Running on-balance volume, seeded at 0 on the first point.
pub fn obv(points: &[PricePoint]) -> Vec<f64> {
    let mut total = 0.0;
    let mut prev: Option<f64> = None;

    points
        .iter()
        .map(|p| {
            if let Some(prev_close) = prev {
                if p.close > prev_close {
                    total += p.volume;
                } else if p.close < prev_close {
                    total -= p.volume;
                }
            }
            prev = Some(p.close);
            total
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileBucket {
    pub range_start: f64,
    pub range_end: f64,
    pub volume: f64,
    /// Point of control: the bucket(s) holding the most volume.
    pub is_poc: bool,
}

impl ProfileBucket {
    pub fn mid(&self) -> f64 {
        (self.range_start + self.range_end) / 2.0
    }
}

pub const DEFAULT_PROFILE_BUCKETS: usize = 24;

/// Volume traded per close-price band over the window.
pub fn volume_profile(points: &[PricePoint], buckets: usize) -> Vec<ProfileBucket> {
    if points.is_empty() || buckets == 0 {
        return Vec::new();
    }

    let min = points.iter().map(|p| p.close).fold(f64::INFINITY, f64::min);
    let max = points.iter().map(|p| p.close).fold(f64::NEG_INFINITY, f64::max);
    let step = (max - min) / buckets as f64;

    let mut profile: Vec<ProfileBucket> = (0..buckets)
        .map(|i| ProfileBucket {
            range_start: min + i as f64 * step,
            range_end: min + (i + 1) as f64 * step,
            volume: 0.0,
            is_poc: false,
        })
        .collect();

    for p in points {
        let idx = if step > 0.0 {
            (((p.close - min) / step).floor() as usize).min(buckets - 1)
        } else {
            buckets - 1
        };
        profile[idx].volume += p.volume;
    }

    let max_volume = profile.iter().map(|b| b.volume).fold(f64::NEG_INFINITY, f64::max);
    for bucket in &mut profile {
        bucket.is_poc = bucket.volume == max_volume;
    }
    profile
}
