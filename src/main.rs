use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use ragate::core;
use ragate::core::config::{AppPaths, Settings};
use ragate::server;
use ragate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;
    let paths = AppPaths::new(&settings.data_dir);
    core::logging::init(&paths, &settings).context("Failed to initialize logging")?;
    tracing::info!("Loaded settings: {:?}", settings);

    let bind_addr = settings.bind_addr();
    let state = AppState::initialize(settings).context("Failed to initialize state")?;
    tracing::info!(
        "Index at {} holds {} records",
        state.paths.index_path.display(),
        state.store.len()?
    );

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
