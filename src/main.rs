// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tokio::net::TcpListener;
use tracing::info;

use tpf_gateway::{api::router, config::Config, logging, state::AppState};

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("Invalid configuration");
    logging::init(config.log_format);
    config.warn_on_default_secrets();

    let state = AppState::from_config(&config).expect("Failed to initialize application state");
    let app = router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");

    info!(%addr, env = %config.env_name, "TPF gateway listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
