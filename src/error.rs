//! Failure taxonomy for a scoring run
//!
//! Library functions return `anyhow::Result`; these variants are the typed
//! causes callers can `downcast_ref` to tell a load failure from an empty join.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{dataset}: input file not found: {path:?}")]
    InputNotFound { dataset: String, path: PathBuf },

    #[error("{dataset}: unsupported file type '{extension}'")]
    UnsupportedFormat { dataset: String, extension: String },

    #[error("{dataset}: missing required columns {columns:?}")]
    MissingColumns { dataset: String, columns: Vec<String> },

    #[error("{dataset}: failed to read input")]
    Unreadable {
        dataset: String,
        #[source]
        source: polars::error::PolarsError,
    },

    #[error("join of consumption records with the nutrient reference produced zero participants")]
    EmptyJoin,

    #[error("invalid scoring standard: {0}")]
    InvalidStandard(String),
}
