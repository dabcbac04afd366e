/// Renovo: backend for planning and tracking home renovation projects
///
/// Main entry point for the Renovo server. Loads configuration from the
/// environment and starts the HTTP server.

use renovo::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Session login at /api/auth/session
/// - Project, budget, document, photo and resource APIs at /api/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RENOVO_* environment variables override the defaults
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
