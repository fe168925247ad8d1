//! Input/output helpers.
//!
//! - CSV ingest, validation and the load-once cache (`ingest`)
//! - filtered CSV and chart JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
