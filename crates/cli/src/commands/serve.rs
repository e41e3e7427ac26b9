//! Serve command handler.
//!
//! Loads the catalog and starts the HTTP API.

use crate::commands::load_matcher;
use clap::Args;
use qamatch_core::{config::AppConfig, AppError, AppResult};
use qamatch_server::ServerState;

/// Serve the catalog over HTTP (POST /chat, GET /health)
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Bind address (overrides server.host)
    #[arg(long, env = "QAMATCH_HOST")]
    pub host: Option<String>,

    /// Port (overrides server.port)
    #[arg(long, env = "QAMATCH_PORT")]
    pub port: Option<u16>,

    /// Disable permissive CORS
    #[arg(long)]
    pub no_cors: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command for catalog '{}'", config.catalog);

        let mut settings = config.server.clone();
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if self.no_cors {
            settings.cors = false;
        }

        // Fail before loading anything if the address is unusable
        settings.socket_addr()?;

        let matcher = load_matcher(config).await?;
        let state = ServerState::new(settings, &config.catalog, matcher);

        qamatch_server::start_server(state)
            .await
            .map_err(|e| AppError::Other(format!("Server error: {}", e)))
    }
}
