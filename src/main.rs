use house_price_intervals::{ConfigIO, Pipeline, PipelineConfig, PipelineError};
use log::info;
use std::env;

// Runs the interval pipeline.
// An optional first argument names a json configuration file, otherwise
// every setting takes its default.
fn main() -> Result<(), PipelineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            PipelineConfig::load(path)?
        }
        None => PipelineConfig::default(),
    };

    let summary = Pipeline::new(config)?.run()?;
    for path in &summary.artifacts {
        info!("Artifact: {}", path.display());
    }
    Ok(())
}
