//! Output module for inspecting the persisted catalog
//!
//! This module handles:
//! - Aggregating catalog statistics from the store
//! - Formatting statistics for terminal display

pub mod stats;

pub use stats::{load_statistics, print_statistics, CatalogStatistics};
