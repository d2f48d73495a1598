use std::sync::Arc;

use anyhow::Context;
use flagbot::config::AppConfig;
use flagbot::engine::Engine;
use flagbot::server;
use flagbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logs
    tracing_subscriber::fmt::init();

    // Load centralized configuration
    let config = AppConfig::load().context("load configuration")?;
    tracing::info!(
        default_target = %config.engine.default_target,
        max_in_flight = config.engine.max_in_flight,
        "starting flag bot"
    );

    let engine = Arc::new(Engine::new(config.engine.clone()));
    let state = AppState::new(engine, config.engine.default_target);

    server::serve(&config.network, state).await
}
