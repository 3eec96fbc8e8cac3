//! Pipeline configuration
//!
//! Paths are resolved from environment variables with defaults relative to
//! `BASE_PATH`:
//!
//! | Variable             | Default                        |
//! |----------------------|--------------------------------|
//! | `BASE_PATH`          | `.`                            |
//! | `CLEAN_DATA_DIR`     | `$BASE_PATH/data/clean`        |
//! | `PROCESSED_DATA_DIR` | `$BASE_PATH/data/processed`    |
//! | `HEI_STANDARD`       | built-in HEI-2015 table        |
//! | `HEI_OUTPUT_FORMAT`  | `csv`                          |
//! | `DIET_DATABASE`      | unset (no database load)       |
//! | `DIET_DATABASE_REPLACE` | `false` (append into `diet`) |

use crate::metrics::ScoringStandard;
use crate::output::OutputFormat;
use crate::utils::pretty_path;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONSUMPTION_FILE: &str = "dr1iff_l_clean.csv";
pub const REFERENCE_FILE: &str = "fped_1720_clean.csv";
pub const PERSON_TOTALS_FILE: &str = "dr1tot_l_clean.csv";
pub const SCORES_STEM: &str = "hei2015_scores";
pub const SUMMARY_FILE: &str = "hei2015_summary.json";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub base_path: PathBuf,
    pub clean_data_dir: PathBuf,
    pub processed_data_dir: PathBuf,
    pub consumption_file: String,
    pub reference_file: String,
    pub person_totals_file: String,
    /// JSON scoring standard; `None` uses HEI-2015
    pub standard_path: Option<PathBuf>,
    pub output_format: OutputFormat,
    pub database_path: Option<PathBuf>,
    /// Drop and recreate the `diet` table before loading
    pub replace_database: bool,
}

impl PipelineConfig {
    /// Default layout under a base directory
    pub fn with_base(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        PipelineConfig {
            clean_data_dir: base_path.join("data").join("clean"),
            processed_data_dir: base_path.join("data").join("processed"),
            base_path,
            consumption_file: CONSUMPTION_FILE.to_string(),
            reference_file: REFERENCE_FILE.to_string(),
            person_totals_file: PERSON_TOTALS_FILE.to_string(),
            standard_path: None,
            output_format: OutputFormat::Csv,
            database_path: None,
            replace_database: false,
        }
    }

    /// Configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_path = get("BASE_PATH").unwrap_or_else(|| ".".to_string());
        let mut config = Self::with_base(base_path);

        if let Some(dir) = get("CLEAN_DATA_DIR") {
            config.clean_data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get("PROCESSED_DATA_DIR") {
            config.processed_data_dir = PathBuf::from(dir);
        }
        config.standard_path = get("HEI_STANDARD").map(PathBuf::from);
        config.database_path = get("DIET_DATABASE").map(PathBuf::from);
        config.replace_database = get("DIET_DATABASE_REPLACE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        if let Some(format) = get("HEI_OUTPUT_FORMAT") {
            config.output_format = format
                .parse::<OutputFormat>()
                .with_context(|| "Invalid HEI_OUTPUT_FORMAT")?;
        }

        Ok(config)
    }

    pub fn consumption_path(&self) -> PathBuf {
        self.clean_data_dir.join(&self.consumption_file)
    }

    pub fn reference_path(&self) -> PathBuf {
        self.clean_data_dir.join(&self.reference_file)
    }

    pub fn person_totals_path(&self) -> PathBuf {
        self.clean_data_dir.join(&self.person_totals_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.processed_data_dir
            .join(format!("{}.{}", SCORES_STEM, self.output_format.extension()))
    }

    pub fn summary_path(&self) -> PathBuf {
        self.processed_data_dir.join(SUMMARY_FILE)
    }

    /// Scoring standard from `standard_path`, or HEI-2015
    pub fn load_standard(&self) -> Result<ScoringStandard> {
        match &self.standard_path {
            Some(path) => {
                info!("Loading scoring standard: {}", self.display_path(path));
                ScoringStandard::load(path)
            }
            None => Ok(ScoringStandard::hei_2015()),
        }
    }

    /// Create output directories if they don't exist
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.processed_data_dir).with_context(|| {
            format!("Failed to create output directory: {:?}", self.processed_data_dir)
        })?;
        if let Some(parent) = self.database_path.as_deref().and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }
        Ok(())
    }

    /// Path for log lines, relative to the base path when possible
    pub fn display_path(&self, path: &Path) -> String {
        pretty_path(path, &self.base_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_under_base_path() {
        let config = PipelineConfig::from_lookup(lookup(&[("BASE_PATH", "/srv/nhanes")])).unwrap();

        assert_eq!(
            config.consumption_path(),
            PathBuf::from("/srv/nhanes/data/clean/dr1iff_l_clean.csv")
        );
        assert_eq!(
            config.output_path(),
            PathBuf::from("/srv/nhanes/data/processed/hei2015_scores.csv")
        );
        assert!(config.standard_path.is_none());
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("CLEAN_DATA_DIR", "/data/in"),
            ("PROCESSED_DATA_DIR", "/data/out"),
            ("HEI_OUTPUT_FORMAT", "parquet"),
            ("HEI_STANDARD", "/etc/hei.json"),
        ]))
        .unwrap();

        assert_eq!(config.reference_path(), PathBuf::from("/data/in/fped_1720_clean.csv"));
        assert_eq!(config.output_path(), PathBuf::from("/data/out/hei2015_scores.parquet"));
        assert_eq!(config.summary_path(), PathBuf::from("/data/out/hei2015_summary.json"));
        assert_eq!(config.standard_path, Some(PathBuf::from("/etc/hei.json")));
        assert!(!config.replace_database);
    }

    #[test]
    fn test_database_settings() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("DIET_DATABASE", "/data/nhanes.duckdb"),
            ("DIET_DATABASE_REPLACE", "TRUE"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/data/nhanes.duckdb")));
        assert!(config.replace_database);
    }

    #[test]
    fn test_invalid_output_format() {
        assert!(PipelineConfig::from_lookup(lookup(&[("HEI_OUTPUT_FORMAT", "xlsx")])).is_err());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[("HEI_STANDARD", "  ")])).unwrap();
        assert!(config.standard_path.is_none());
        assert_eq!(config.load_standard().unwrap(), ScoringStandard::hei_2015());
    }
}
