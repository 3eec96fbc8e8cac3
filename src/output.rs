//! Result table I/O
//!
//! The column schema is the contract with the dashboard and the `diet` table
//! loader, so column names and order are fixed here in one place.

use crate::metrics::Component;
use crate::scorer::{DietQualityResult, DietScoreCategory};
use crate::utils::{f64_values, require_columns, string_values};
use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

pub const PARTICIPANT_COL: &str = "participant_id";
pub const TOTAL_WEIGHT_COL: &str = "total_diet_weight";
pub const ITEM_WEIGHT_COL: &str = "food_item_weight";
pub const CATEGORY_COL: &str = "diet_score_category";
pub const SCORE_COL: &str = "hei_score";

/// Output column names, in order
pub fn result_columns() -> Vec<&'static str> {
    let mut columns = vec![PARTICIPANT_COL, TOTAL_WEIGHT_COL, ITEM_WEIGHT_COL, CATEGORY_COL];
    columns.extend(Component::ALL.iter().map(|c| c.column()));
    columns.push(SCORE_COL);
    columns
}

/// On-disk format of the result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }

    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow!("No file extension on {:?}", path))?;
        extension.parse()
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "parquet" => Ok(OutputFormat::Parquet),
            other => Err(anyhow!("Unsupported output format '{}'", other)),
        }
    }
}

/// Build the result DataFrame
pub fn results_to_frame(results: &[DietQualityResult]) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new(
            PARTICIPANT_COL.into(),
            results.iter().map(|r| r.participant_id.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            TOTAL_WEIGHT_COL.into(),
            results.iter().map(|r| r.total_diet_weight).collect::<Vec<_>>(),
        ),
        Column::new(
            ITEM_WEIGHT_COL.into(),
            results.iter().map(|r| r.food_item_weight).collect::<Vec<_>>(),
        ),
        Column::new(
            CATEGORY_COL.into(),
            results.iter().map(|r| r.category.as_str()).collect::<Vec<_>>(),
        ),
    ];

    for component in Component::ALL {
        columns.push(Column::new(
            component.column().into(),
            results.iter().map(|r| r.component(component)).collect::<Vec<_>>(),
        ));
    }

    columns.push(Column::new(
        SCORE_COL.into(),
        results.iter().map(|r| r.hei_score).collect::<Vec<_>>(),
    ));

    DataFrame::new(columns).with_context(|| "Failed to build result table")
}

/// Read result rows back from a frame with the output schema
///
/// A missing category is recomputed as "Unknown"; a missing component score
/// reads as 0, matching how it was scored.
pub fn frame_to_results(df: &DataFrame) -> Result<Vec<DietQualityResult>> {
    const CONTEXT: &str = "diet scores";
    require_columns(df, &result_columns(), CONTEXT)?;

    let ids = string_values(df, PARTICIPANT_COL, CONTEXT)?;
    let total_weights = f64_values(df, TOTAL_WEIGHT_COL, CONTEXT)?;
    let item_weights = f64_values(df, ITEM_WEIGHT_COL, CONTEXT)?;
    let categories = string_values(df, CATEGORY_COL, CONTEXT)?;
    let scores = f64_values(df, SCORE_COL, CONTEXT)?;
    let component_values: Vec<Vec<Option<f64>>> = Component::ALL
        .iter()
        .map(|c| f64_values(df, c.column(), CONTEXT))
        .collect::<Result<_>>()?;

    let mut results = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let participant_id = ids[row]
            .clone()
            .ok_or_else(|| anyhow!("{}: row {} has no participant id", CONTEXT, row))?;

        let mut components = [0.0; Component::COUNT];
        for component in Component::ALL {
            components[component.index()] =
                component_values[component.index()][row].unwrap_or(0.0);
        }

        let category = match categories[row].as_deref() {
            Some(label) => label.parse()?,
            None => DietScoreCategory::Unknown,
        };

        results.push(DietQualityResult {
            participant_id,
            total_diet_weight: total_weights[row],
            food_item_weight: item_weights[row],
            components,
            hei_score: scores[row],
            category,
        });
    }

    Ok(results)
}

/// Write the result table, format chosen by the path's extension
pub fn write_results(results: &[DietQualityResult], path: &Path) -> Result<()> {
    let mut df = results_to_frame(results)?;
    let format = OutputFormat::from_path(path)?;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;

    match format {
        OutputFormat::Csv => {
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)
                .with_context(|| format!("Failed to write CSV: {:?}", path))?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(&mut file)
                .finish(&mut df)
                .with_context(|| format!("Failed to write Parquet: {:?}", path))?;
        }
    }

    Ok(())
}

/// Reload a persisted result table
pub fn read_results(path: &Path) -> Result<Vec<DietQualityResult>> {
    let df = crate::data::load_table(path, "diet scores")?;
    frame_to_results(&df)
}
