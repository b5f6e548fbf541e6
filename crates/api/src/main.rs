//! Apprentice Status Predictor - Main Entry Point

use apprentice_api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("=== Apprentice Status Predictor v{} ===", env!("CARGO_PKG_VERSION"));
    match &config.dataset.path {
        Some(path) => info!(
            "Artifact: {}, dataset: {}",
            config.artifact.path.display(),
            path.display()
        ),
        None => info!(
            "Artifact: {}, dataset embedded in artifact",
            config.artifact.path.display()
        ),
    }

    run_server(config).await
}
