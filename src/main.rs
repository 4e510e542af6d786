//! Server binary: loads configuration and models, then serves HTTP.

use nephroscan::core::{AppConfig, ModelRegistry};
use nephroscan::server::build_router;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    nephroscan::init_tracing();

    let config = AppConfig::from_env()?;
    info!(
        models_dir = %config.models_dir.display(),
        port = config.port,
        "starting nephroscan"
    );

    // Model loading is fatal on failure: the service never starts with a
    // partial registry.
    let registry = Arc::new(ModelRegistry::load(&config)?);
    info!(models = ?registry.model_names(), "registry initialized");

    let app = build_router(registry, &config)?;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
