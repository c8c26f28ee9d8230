use std::path::PathBuf;
use std::sync::Arc;

use appraise_predict::ModelContext;
use appraise_server::{build_router, tracing_setup, AppConfig, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    // first CLI argument, then APPRAISE_CONFIG, then ./appraise.toml if present
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("APPRAISE_CONFIG").ok())
        .map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    let _logging = tracing_setup::init_tracing(&config.logging)?;

    info!(config = ?config_path, "starting appraise server");

    let models = config.models.clone();
    let context = tokio::task::spawn_blocking(move || ModelContext::load(&models))
        .await?
        .map_err(appraise_error::Error::from)?;
    info!(shape = %context.shape(), device = context.device(), "models loaded");

    let app = build_router(AppState::new(Arc::new(context)), config.server.max_upload_bytes);

    let listen_addr = config.server.listen_addr();
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!(%listen_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
