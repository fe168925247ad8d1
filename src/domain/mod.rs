//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - loaded rows and the dataset (`TripRecord`, `Dataset`)
//! - the caller's filter (`FilterSelection`, `DashboardConfig`)
//! - aggregate outputs (`DailyTotal`, `ForecastPoint`, `Kpis`)

pub mod types;

pub use types::*;

#[cfg(test)]
pub(crate) mod strategies;
