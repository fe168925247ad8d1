//! Spike detection on daily trip totals.
//!
//! A day is a spike when its total is strictly above `mean + 2 * sd`, using
//! the sample standard deviation of the series.

use serde::Serialize;

use crate::domain::DailyTotal;
use crate::math::{mean, sample_std_dev};

pub const SPIKE_SIGMAS: f64 = 2.0;

/// The threshold and the days above it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spikes {
    /// `None` when the series is too short to have a spread.
    pub threshold: Option<f64>,
    pub days: Vec<DailyTotal>,
}

/// `mean + SPIKE_SIGMAS * sd` of the series; `None` below two points.
pub fn spike_threshold(series: &[DailyTotal]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let values: Vec<f64> = series.iter().map(|p| p.trips as f64).collect();
    Some(mean(&values)? + SPIKE_SIGMAS * sample_std_dev(&values)?)
}

/// Days whose trips exceed the spike threshold, in series order.
pub fn detect_spikes(series: &[DailyTotal]) -> Spikes {
    let Some(threshold) = spike_threshold(series) else {
        return Spikes {
            threshold: None,
            days: Vec::new(),
        };
    };
    let days = series
        .iter()
        .filter(|p| p.trips as f64 > threshold)
        .copied()
        .collect();
    Spikes {
        threshold: Some(threshold),
        days,
    }
}
