//! HTTP surface for front-ends that drive the installer remotely.
//!
//! Two routes are served (see [`routes`]): `GET /driver` reports the
//! installed and required versions, and `/installdriver` runs an install
//! while streaming its progress as plain-text lines.

pub mod routes;

use std::sync::Arc;

use axum::Router;
use colored::Colorize;
use tokio::net::TcpListener;

use crate::libs::driver_installer::DriverInstaller;
use crate::libs::version_probe::CommandRunner;
use crate::{log_info, log_warn};

/// Shared state handed to every request handler.
pub struct AppState {
    pub installer: DriverInstaller,
    /// Runs the installed driver for `GET /driver`.
    pub runner: Arc<dyn CommandRunner>,
}

impl AppState {
    pub fn new(installer: DriverInstaller, runner: Arc<dyn CommandRunner>) -> Self {
        Self { installer, runner }
    }
}

/// Builds the application router with its state attached.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new().merge(routes::create_routes()).with_state(state)
}

/// Binds `address` and serves until Ctrl-C.
pub async fn serve(address: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).await?;
    log_info!("[Server] Listening on {}", listener.local_addr()?.to_string().green());

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info!("[Server] Stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log_warn!("[Server] Could not listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
    log_info!("[Server] Shutting down");
}
