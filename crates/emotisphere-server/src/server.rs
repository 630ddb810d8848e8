//! Server configuration and lifecycle.
//!
//! [`start_server`] binds, serves, and returns after `Ctrl-C` once
//! in-flight requests have drained.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use emotisphere_adapters::ConfigError;
use emotisphere_core::config::AUTO_START_INTERVAL;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Listener and boot-time scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
    /// Interval used when the pipeline starts itself at boot.
    pub auto_start_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
            auto_start_interval: AUTO_START_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    ///
    /// - `HOST` -- bind address (default `0.0.0.0`)
    /// - `PORT` -- listen port (default 8080)
    /// - `AUTO_START_INTERVAL_SECS` -- boot-time cycle interval (default 600)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup. Unset or blank values
    /// take their defaults; unparseable values are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or(defaults.host);

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: format!("{e}"),
            })?,
            None => defaults.port,
        };

        let auto_start_interval = match var("AUTO_START_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|e| {
                ConfigError::Invalid {
                    var: "AUTO_START_INTERVAL_SECS",
                    reason: format!("{e}"),
                }
            })?),
            None => defaults.auto_start_interval,
        };

        Ok(Self {
            host,
            port,
            auto_start_interval,
        })
    }
}

/// Serve until `Ctrl-C`.
///
/// # Errors
///
/// Returns an error if the address is invalid, the listener cannot bind,
/// or the server hits a fatal I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;

    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, "server listening");
    info!("subscriber endpoint: ws://{addr}/ws");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl-C, serving until killed: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
