/// Server setup and initialization
///
/// Wires together all components: database, file store, services, template
/// catalog, background sweep and HTTP routes. Provides the application
/// factory used by `main` and by the end-to-end tests.

use crate::{
    api::{create_api_routes, AppState},
    auth::{HttpIdentityProvider, IdentityProvider},
    config::Config,
    db::Database,
    runtime::{OverdueSweep, SweepScheduler},
    services::{Services, TemplateCatalog},
    storage::FileStore,
};
use anyhow::Result;
use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

/// Build the shared application state, using the configured identity provider
pub async fn create_state(config: Config) -> Result<AppState> {
    let identity = Arc::new(HttpIdentityProvider::new(config.auth.userinfo_url.clone())?);
    create_state_with(config, identity).await
}

/// Build the shared application state around a given identity provider
pub async fn create_state_with(config: Config, identity: Arc<dyn IdentityProvider>) -> Result<AppState> {
    tracing::info!("📁 Using data directory: {}", config.database.data_dir);
    let database = Database::connect(&config.database_path()).await?;

    let uploads_dir = config.uploads_dir();
    std::fs::create_dir_all(&uploads_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create uploads directory: {}", e))?;
    let files = FileStore::new(uploads_dir);

    tracing::info!("🏗️ Initializing services");
    let services = Services::new(database.pool().clone(), files);

    tracing::info!("📋 Loading work item templates");
    services
        .templates
        .seed_defaults()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed default templates: {}", e))?;
    let templates = Arc::new(TemplateCatalog::new(services.templates.clone()));
    templates
        .init_from_storage()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load template catalog: {}", e))?;

    let sweep = if config.scheduler.enabled {
        tracing::info!("⏰ Initializing overdue sweep");
        let scheduler = SweepScheduler::new(OverdueSweep::new(services.clone()))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize scheduler: {}", e))?;
        scheduler.start(&config.scheduler.sweep_schedule).await?;
        Some(Arc::new(scheduler))
    } else {
        tracing::info!("⏭️ Overdue sweep disabled");
        None
    };

    Ok(AppState {
        services,
        identity,
        templates,
        sweep,
        config: Arc::new(config),
    })
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = match state
        .config
        .server
        .allowed_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => CorsLayer::new().allow_origin(AllowOrigin::exact(origin)),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    let upload_limit = state.config.storage.upload_limit_bytes;

    tracing::info!("📡 Creating HTTP router with all endpoints");
    create_api_routes(state.clone())
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the main Axum application
pub async fn create_app(config: Config) -> Result<Router> {
    let state = create_state(config).await?;
    let app = create_router(state);
    tracing::info!("✅ Application initialized successfully");
    Ok(app)
}

/// Start the HTTP server with the given configuration
///
/// Serves until Ctrl-C, then stops the background sweep.
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Renovo server...");

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = create_state(config).await?;
    let app = create_router(state.clone());

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweep) = &state.sweep {
        sweep.stop().await?;
    }
    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
