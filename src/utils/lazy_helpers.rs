//! DataFrame column validation and typed extraction
//!
//! Provides safe, explicit patterns for pulling typed columns out of Polars
//! frames so a missing or renamed column fails loudly instead of silently
//! producing an empty score table.

use crate::error::PipelineError;
use anyhow::{Context, Result};
use polars::prelude::*;
use std::collections::HashSet;

/// Check that every required column is present
///
/// All missing columns are reported at once, in the order requested.
///
/// # Errors
/// [`PipelineError::MissingColumns`] naming the dataset and the absent columns.
pub fn require_columns(df: &DataFrame, columns: &[&str], dataset: &str) -> Result<()> {
    let actual_cols: HashSet<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    let missing: Vec<String> = columns
        .iter()
        .filter(|&&name| !actual_cols.contains(name))
        .map(|&name| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns {
            dataset: dataset.to_string(),
            columns: missing,
        }
        .into());
    }

    Ok(())
}

/// Extract a numeric column as `Option<f64>` values
///
/// Integer and string columns are cast (non-numeric text becomes missing).
/// NaN is folded into `None` so downstream code has one notion of missing.
pub fn f64_values(df: &DataFrame, name: &str, context: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .with_context(|| format!("{}: Missing {} column", context, name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("{}: Column '{}' is not numeric", context, name))?;

    let values = column
        .f64()?
        .into_iter()
        .map(|opt| opt.filter(|v| !v.is_nan()))
        .collect();

    Ok(values)
}

/// Extract an identifier column as `Option<String>` values
pub fn string_values(df: &DataFrame, name: &str, context: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .with_context(|| format!("{}: Missing {} column", context, name))?
        .cast(&DataType::String)
        .with_context(|| format!("{}: Column '{}' cannot be read as text", context, name))?;

    let values = column
        .str()?
        .into_iter()
        .map(|opt| opt.map(|s| s.to_string()))
        .collect();

    Ok(values)
}

/// Extract participant identifiers as canonical text
///
/// Integral float ids render without the trailing `.0` and text ids are
/// trimmed, so a participant keys identically across table dtypes.
pub fn id_values(df: &DataFrame, name: &str, context: &str) -> Result<Vec<Option<String>>> {
    let dtype = df
        .column(name)
        .with_context(|| format!("{}: Missing {} column", context, name))?
        .dtype()
        .clone();

    if dtype.is_float() {
        let values = f64_values(df, name, context)?;
        return Ok(values.into_iter().map(|v| v.map(float_id)).collect());
    }

    let values = string_values(df, name, context)?;
    Ok(values
        .into_iter()
        .map(|v| v.and_then(|s| text_id(&s)))
        .collect())
}

/// Replace an id column with its canonical String form
pub fn normalize_id_column(df: &mut DataFrame, name: &str, context: &str) -> Result<()> {
    let ids = id_values(df, name, context)?;
    df.with_column(Column::new(name.into(), ids))
        .with_context(|| format!("{}: Failed to normalize {} column", context, name))?;
    Ok(())
}

fn float_id(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn text_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.parse::<i64>().is_err() {
        if let Ok(value) = trimmed.parse::<f64>() {
            if value.is_finite() {
                return Some(float_id(value));
            }
        }
    }
    Some(trimmed.to_string())
}
