//! Data Loading and Management
//!
//! Loads the three cleaned inputs of the scoring engine with Polars:
//! per-item consumption records, the food patterns equivalents reference and
//! per-person day totals. Any input that is absent, unreadable or missing a
//! required column aborts the run before aggregation starts.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::nutrients::NutrientCategory;
use crate::utils::require_columns;
use anyhow::Result;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Columns required in the per-item consumption table
pub const CONSUMPTION_COLS: &[&str] = &[
    "participant_id",
    "food_code",
    "grams_consumed",
    "energy_kcal",
    "food_item_weight",
];

/// Columns required in the per-person day totals table
pub const PERSON_TOTAL_COLS: &[&str] = &[
    "participant_id",
    "sodium_mg",
    "satfat_g",
    "energy_kcal",
    "total_diet_weight",
];

/// Food code column of the reference table
pub const REFERENCE_KEY_COL: &str = "FOODCODE";

/// SAS transport files encode some missing values as this denormal
const SAS_UNDERFLOW: f64 = 5.39760534693402e-79;
const SAS_UNDERFLOW_TOLERANCE: f64 = 1e-80;

/// Required reference columns: the food code plus every nutrient category
pub fn reference_columns() -> Vec<&'static str> {
    std::iter::once(REFERENCE_KEY_COL)
        .chain(NutrientCategory::ALL.iter().map(|c| c.column()))
        .collect()
}

/// Main data holder for diet scoring
pub struct DietData {
    /// One row per food item consumed per participant
    pub consumption: DataFrame,

    /// Nutrient equivalents per 100g, keyed by food code
    pub reference: DataFrame,

    /// Day-level sodium, saturated fat and energy per participant
    pub person_totals: DataFrame,
}

impl DietData {
    /// Load all inputs from the configured clean data directory
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        info!("Loading dietary inputs from {}", config.display_path(&config.clean_data_dir));

        let consumption = load_table(&config.consumption_path(), "consumption")?;
        let reference = load_table(&config.reference_path(), "nutrient reference")?;
        let person_totals = load_table(&config.person_totals_path(), "person totals")?;

        let data = Self::from_frames(consumption, reference, person_totals)?;

        info!("  Consumption records: {}", data.consumption.height());
        info!("  Reference food codes: {}", data.reference.height());
        info!("  Person totals: {}", data.person_totals.height());

        Ok(data)
    }

    /// Build from frames already in memory
    ///
    /// Reference headers are cleaned of unit suffixes and SAS underflow values
    /// before the required columns are checked.
    pub fn from_frames(
        consumption: DataFrame,
        reference: DataFrame,
        person_totals: DataFrame,
    ) -> Result<Self> {
        require_columns(&consumption, CONSUMPTION_COLS, "consumption")?;
        require_columns(&person_totals, PERSON_TOTAL_COLS, "person totals")?;

        let reference = strip_unit_suffixes(reference)?;
        require_columns(&reference, &reference_columns(), "nutrient reference")?;
        let reference = mask_sas_underflow(reference)?;

        Ok(DietData {
            consumption,
            reference,
            person_totals,
        })
    }
}

/// Load a table, dispatching on the file extension
///
/// Supported: `.csv`, `.parquet`, `.json` (array) and `.ndjson`/`.jsonl`.
pub fn load_table(path: &Path, dataset: &str) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::InputNotFound {
            dataset: dataset.to_string(),
            path: path.to_path_buf(),
        }
        .into());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    debug!("Reading {} ({}) from {:?}", dataset, extension, path);

    let result = match extension.as_str() {
        "csv" => read_csv(path),
        "parquet" => File::open(path)
            .map_err(PolarsError::from)
            .and_then(|file| ParquetReader::new(file).finish()),
        "json" => File::open(path)
            .map_err(PolarsError::from)
            .and_then(|file| JsonReader::new(file).finish()),
        "ndjson" | "jsonl" => File::open(path)
            .map_err(PolarsError::from)
            .and_then(|file| {
                JsonReader::new(file)
                    .with_json_format(JsonFormat::JsonLines)
                    .finish()
            }),
        _ => {
            return Err(PipelineError::UnsupportedFormat {
                dataset: dataset.to_string(),
                extension,
            }
            .into())
        }
    };

    result.map_err(|source| {
        PipelineError::Unreadable {
            dataset: dataset.to_string(),
            source,
        }
        .into()
    })
}

fn read_csv(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Rename headers like `F_TOTAL (cup eq)` to `F_TOTAL`
fn strip_unit_suffixes(mut df: DataFrame) -> Result<DataFrame> {
    let renames: Vec<(String, String)> = df
        .get_column_names()
        .into_iter()
        .filter_map(|name| {
            let cleaned = name.split('(').next().unwrap_or("").trim().to_string();
            (cleaned != name.as_str() && !cleaned.is_empty()).then(|| (name.to_string(), cleaned))
        })
        .collect();

    for (old, new) in renames {
        debug!("Reference column '{}' -> '{}'", old, new);
        df.rename(&old, new.as_str().into())?;
    }
    // polars 0.46 `rename` leaves a stale cached schema behind
    df.clear_schema();

    Ok(df)
}

/// Cast nutrient columns to Float64 and null out SAS underflow artifacts
fn mask_sas_underflow(df: DataFrame) -> Result<DataFrame> {
    let exprs: Vec<Expr> = NutrientCategory::ALL
        .iter()
        .map(|category| {
            let name = category.column();
            let value = col(name).cast(DataType::Float64);
            let is_artifact = value
                .clone()
                .gt_eq(lit(SAS_UNDERFLOW - SAS_UNDERFLOW_TOLERANCE))
                .and(value.clone().lt_eq(lit(SAS_UNDERFLOW + SAS_UNDERFLOW_TOLERANCE)));

            when(is_artifact)
                .then(lit(NULL).cast(DataType::Float64))
                .otherwise(value)
                .alias(name)
        })
        .collect();

    let cleaned = df.lazy().with_columns(exprs).collect()?;
    Ok(cleaned)
}
