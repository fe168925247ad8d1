//! Plain-text chart rendering for `trips report --plot`.

pub mod ascii;

pub use ascii::*;
