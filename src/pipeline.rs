//! End-to-end scoring run
//!
//! Load → aggregate → merge with person totals → score in parallel → write the
//! result table and a JSON summary (and optionally the `diet` table).

use crate::aggregation::{aggregate_nutrients, collect_person_totals, merge_intakes, AggregationSummary};
use crate::config::PipelineConfig;
use crate::data::DietData;
use crate::metrics::{Component, ScoringStandard};
use crate::output::write_results;
use crate::scorer::{DietQualityResult, DietScorer, ScoreSummary};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Scores plus the accounting for how they were produced
#[derive(Debug, Clone)]
pub struct ScoringRun {
    pub results: Vec<DietQualityResult>,
    pub aggregation: AggregationSummary,
    pub summary: ScoreSummary,
}

/// Contents of `hei2015_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub max_score: f64,
    pub aggregation: AggregationSummary,
    pub scores: ScoreSummary,
}

/// What a completed run wrote
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub output_path: PathBuf,
    pub summary_path: PathBuf,
    pub run: ScoringRun,
}

/// Aggregate and score loaded inputs without touching the filesystem
pub fn score_data(data: &DietData, standard: ScoringStandard) -> Result<ScoringRun> {
    let aggregation = aggregate_nutrients(data)?;
    let totals = collect_person_totals(data)?;
    let intakes = merge_intakes(aggregation.aggregates, totals);

    let mut summary = aggregation.summary;
    if intakes.len() > summary.participants {
        info!(
            "{} participants have person totals but no matched food items",
            intakes.len() - summary.participants
        );
    }
    summary.participants = intakes.len();

    let scorer = DietScorer::new(standard);
    let results = scorer.score_all_parallel(&intakes);
    let score_summary = ScoreSummary::from_results(&results);

    Ok(ScoringRun {
        results,
        aggregation: summary,
        summary: score_summary,
    })
}

/// Run the full pipeline for a configuration
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    let start = Instant::now();

    let standard = config.load_standard()?;
    let max_score = standard.max_total();
    let data = DietData::load(config)?;
    let run = score_data(&data, standard)?;

    config.ensure_directories()?;

    let output_path = config.output_path();
    write_results(&run.results, &output_path)?;
    info!(
        "Wrote {} scores to {}",
        run.results.len(),
        config.display_path(&output_path)
    );

    let summary_path = config.summary_path();
    let run_summary = RunSummary {
        generated_at: chrono::Utc::now().to_rfc3339(),
        max_score,
        aggregation: run.aggregation,
        scores: run.summary.clone(),
    };
    let json = serde_json::to_string_pretty(&run_summary)
        .with_context(|| "Failed to serialize run summary")?;
    fs::write(&summary_path, json)
        .with_context(|| format!("Failed to write summary: {:?}", summary_path))?;

    load_database(config, &run.results)?;
    log_summary(&run);
    info!("Scoring complete in {:.2?}", start.elapsed());

    Ok(PipelineReport {
        output_path,
        summary_path,
        run,
    })
}

#[cfg(feature = "database")]
fn load_database(config: &PipelineConfig, results: &[DietQualityResult]) -> Result<()> {
    if let Some(path) = &config.database_path {
        let rows = crate::database::load_results(results, path, config.replace_database)?;
        info!("Loaded {} rows into diet table at {}", rows, config.display_path(path));
    }
    Ok(())
}

#[cfg(not(feature = "database"))]
fn load_database(config: &PipelineConfig, _results: &[DietQualityResult]) -> Result<()> {
    if config.database_path.is_some() {
        tracing::warn!("DIET_DATABASE is set but this build lacks the `database` feature; skipping");
    }
    Ok(())
}

fn log_summary(run: &ScoringRun) {
    info!("Participants scored: {}", run.summary.participants);
    for (component, (column, mean)) in Component::ALL.iter().zip(&run.summary.component_means) {
        info!("  {:<24} ({}) mean {:.1}", component.label(), column, mean);
    }
    info!("  Mean HEI score: {:.1}", run.summary.mean_hei_score);
    for (category, count) in &run.summary.category_counts {
        info!("  {}: {}", category, count);
    }
}
