//! `trip-analytics` library crate.
//!
//! The binary (`trips`) is a thin wrapper around this library so that:
//!
//! - the filter/aggregate/forecast pipeline is testable without a terminal
//! - the TUI and the scripted subcommands share one computation path
//! - chart descriptions stay independent of any renderer

pub mod anomaly;
pub mod app;
pub mod chart;
pub mod cli;
pub mod domain;
pub mod error;
pub mod filter;
pub mod forecast;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;
