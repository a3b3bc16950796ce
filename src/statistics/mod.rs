//! Per-zone statistical reductions
//!
//! # Organization
//!
//! This module is organized into submodules:
//! - [`operations`]: statistic names and parsing
//! - [`summary`]: continuous reductions over masked pixel values
//! - [`categorical`]: class-code histograms and the code to label map
//! - [`request`]: the per-run request bundling all of the above

pub mod categorical;
pub mod operations;
pub mod request;
pub mod summary;

// Re-export the main types for convenience
pub use categorical::{CategoryCounts, CategoryMap};
pub use operations::Statistic;
pub use request::StatisticRequest;
pub use summary::PixelSample;
