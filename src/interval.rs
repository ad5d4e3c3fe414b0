//! Inter-arrival statistics of the per-category timestamp lists.

use serde::{Deserialize, Serialize};

use crate::constants::HISTOGRAM_BINS;
use crate::entity::Category;

/// Expected period of a message category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalProfile {
    pub name: String,
    pub category: Category,
    /// Expected interval, milliseconds.
    pub center_ms: f64,
    /// Half width of the accepted band around `center_ms`, milliseconds.
    pub deviation_ms: f64,
    #[serde(default = "default_bins")]
    pub bins: usize,
}

fn default_bins() -> usize {
    HISTOGRAM_BINS
}

impl IntervalProfile {
    pub fn new(name: &str, category: Category, center_ms: f64, deviation_ms: f64) -> Self {
        IntervalProfile {
            name: name.to_string(),
            category,
            center_ms,
            deviation_ms,
            bins: HISTOGRAM_BINS,
        }
    }

    pub fn lower(&self) -> f64 {
        self.center_ms - self.deviation_ms
    }

    pub fn upper(&self) -> f64 {
        self.center_ms + self.deviation_ms
    }
}

/// Profiles for every category, from the nominal transmit rates.
pub fn default_profiles() -> Vec<IntervalProfile> {
    vec![
        IntervalProfile::new("airborne-position", Category::AirbornePosition, 500.0, 100.0),
        IntervalProfile::new("surface-position-high", Category::SurfacePosition, 500.0, 100.0),
        IntervalProfile::new("surface-position-low", Category::SurfacePosition, 5000.0, 200.0),
        IntervalProfile::new("identification", Category::Identification, 5000.0, 200.0),
        IntervalProfile::new("velocity", Category::Velocity, 500.0, 100.0),
        IntervalProfile::new("status", Category::Status, 5000.0, 200.0),
        IntervalProfile::new("emergency", Category::Emergency, 800.0, 100.0),
        IntervalProfile::new("mode-change", Category::ModeChange, 800.0, 100.0),
        IntervalProfile::new("tcas-ra", Category::TcasRa, 800.0, 100.0),
        IntervalProfile::new("target-state", Category::TargetState, 1250.0, 50.0),
        IntervalProfile::new("operational-status-air", Category::OperationalStatusAir, 2500.0, 100.0),
        IntervalProfile::new(
            "operational-status-surface",
            Category::OperationalStatusSurface,
            2500.0,
            100.0,
        ),
        IntervalProfile::new("acquisition", Category::Acquisition, 1000.0, 200.0),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalDistribution {
    pub count: usize,
    pub min_ms: f64,
    pub max_ms: f64,
    /// Intervals below `center - dev`.
    pub low: usize,
    /// Equal width bins over `[center - dev, center + dev]`, last bin closed.
    pub middle: Vec<usize>,
    /// Intervals above `center + dev`.
    pub high: usize,
}

impl IntervalDistribution {
    pub fn in_band(&self) -> usize {
        self.middle.iter().sum()
    }
}

/// Consecutive differences of the sorted timestamps, in milliseconds.
pub fn intervals_ms(timestamps: &[f64]) -> Vec<f64> {
    let mut sorted = timestamps.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
        .windows(2)
        .map(|w| (w[1] - w[0]) * 1000.0)
        .filter(|d| *d >= 0.0)
        .collect()
}

/// Bucket the intervals of `timestamps` around the profile's expected period.
///
/// Fewer than two timestamps means no data.
pub fn analyze(timestamps: &[f64], profile: &IntervalProfile) -> Option<IntervalDistribution> {
    let intervals = intervals_ms(timestamps);
    if intervals.is_empty() {
        return None;
    }

    let lower = profile.lower();
    let upper = profile.upper();
    let bins = profile.bins.max(1);
    let width = (upper - lower) / bins as f64;

    let mut dist = IntervalDistribution {
        count: intervals.len(),
        min_ms: f64::INFINITY,
        max_ms: f64::NEG_INFINITY,
        low: 0,
        middle: vec![0; bins],
        high: 0,
    };

    for &d in &intervals {
        dist.min_ms = dist.min_ms.min(d);
        dist.max_ms = dist.max_ms.max(d);

        if d < lower {
            dist.low += 1;
        } else if d > upper {
            dist.high += 1;
        } else {
            let ndx = if width > 0.0 {
                (((d - lower) / width) as usize).min(bins - 1)
            } else {
                0
            };
            dist.middle[ndx] += 1;
        }
    }

    Some(dist)
}
