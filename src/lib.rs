//! HEI-2015 Diet Quality Scorer
//!
//! Scores dietary recall survey extracts against the Healthy Eating Index 2015.
//!
//! Layout:
//! - `data`: input loading with Polars (consumption, nutrient reference, person totals)
//! - `aggregation`: item join, per-participant sums and densities per 1000 kcal
//! - `metrics/`: the 13 components and the threshold table they are scored against
//! - `scorer`: parallel per-participant scoring and quality bands
//! - `output`: result table schema and CSV/Parquet I/O
//! - `pipeline`: the end-to-end run driven by [`PipelineConfig`]

pub mod utils;
pub mod error;
pub mod config;
pub mod nutrients;
pub mod data;
pub mod aggregation;
pub mod metrics;
pub mod scorer;
pub mod output;
pub mod pipeline;

#[cfg(feature = "database")]
pub mod database;

// Re-export commonly used types
pub use aggregation::{aggregate_nutrients, collect_person_totals, merge_intakes, ParticipantIntake, PersonAggregate};
pub use config::PipelineConfig;
pub use data::DietData;
pub use error::PipelineError;
pub use metrics::{CategoryBands, Component, ScoringDirection, ScoringRule, ScoringStandard};
pub use nutrients::{NutrientCategory, NutrientVector};
pub use output::{read_results, write_results, OutputFormat};
pub use pipeline::{run, score_data, PipelineReport};
pub use scorer::{DietQualityResult, DietScoreCategory, DietScorer, ScoreSummary};
