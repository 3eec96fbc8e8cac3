//! Utility modules for diet scoring
//!
//! Contains shared functionality used across the pipeline:
//! - Normalization: Piecewise linear score interpolation
//! - DataFrame helpers: Column validation and typed extraction
//! - Paths: Log-friendly path display

pub mod normalization;
pub mod lazy_helpers;
pub mod paths;

// Re-export commonly used helpers
pub use normalization::{ascending_score, descending_score, interpolate_between};
pub use lazy_helpers::{f64_values, id_values, normalize_id_column, require_columns, string_values};
pub use paths::pretty_path;
