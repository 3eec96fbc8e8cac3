// Score dietary recall extracts with HEI-2015
//
// Usage: cargo run --release --bin score_diet
// Paths come from BASE_PATH / CLEAN_DATA_DIR / PROCESSED_DATA_DIR.

use hei_scorer::{run, PipelineConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hei_scorer=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PipelineConfig::from_env()?;

    tracing::info!("Configuration:");
    tracing::info!("  BASE_PATH: {:?}", config.base_path);
    tracing::info!("  CLEAN_DATA_DIR: {}", config.display_path(&config.clean_data_dir));
    tracing::info!("  PROCESSED_DATA_DIR: {}", config.display_path(&config.processed_data_dir));

    let report = run(&config)?;

    tracing::info!("Scores: {}", config.display_path(&report.output_path));
    tracing::info!("Summary: {}", config.display_path(&report.summary_path));

    Ok(())
}
