//! Helpers shared across the tonegraph crates.

pub mod db;
pub mod profiling;

pub use db::{db_to_gain, gain_to_db, MAGNITUDE_FLOOR};
pub use profiling::SpanTimer;

/// Magnitudes in decibels.
pub type Decibels = f64;
