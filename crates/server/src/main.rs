// crates/server/src/main.rs
//! Runwatch server binary.

use anyhow::{Context, Result};
use runwatch_server::{create_app_with_state, init_metrics, AppState, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("runwatch_server=info,runwatch_core=info,tower_http=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env();
    init_metrics();

    let addr = config.bind_addr();
    tracing::info!(
        %addr,
        runner = %config.runner.program,
        output_root = %config.output_root.display(),
        log_capacity = config.log_capacity,
        "Starting runwatch server"
    );

    let state = AppState::new(config);
    let app = create_app_with_state(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    eprintln!("runwatch listening on http://{addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
