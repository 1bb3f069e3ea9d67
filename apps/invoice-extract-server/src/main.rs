//! Invoice Extract Server

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoice_extract_server::config::Config;
use invoice_extract_server::db;
use invoice_extract_server::extraction::ExtractionService;
use invoice_extract_server::gemini::GeminiClient;
use invoice_extract_server::routes;
use invoice_extract_server::state::AppState;
use invoice_extract_server::storage::{S3Client, StorageFetcher, UrlFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invoice_extract_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config from env: {}, using defaults", e);
        Config::default()
    });

    tracing::info!("Starting Invoice Extract Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("S3 region: {}", config.storage.region);
    if let Some(endpoint) = &config.storage.endpoint {
        tracing::info!("S3 endpoint: {}", endpoint);
    }

    // Document sources
    let s3_client = S3Client::new(&config.storage).await;
    let url_fetcher = UrlFetcher::new().context("Failed to build HTTP client")?;
    let fetcher = Arc::new(StorageFetcher::new(url_fetcher, s3_client));

    let generator = Arc::new(GeminiClient::new(&config.gemini.base_url));
    let extraction = ExtractionService::new(fetcher, generator);

    // HITL schema
    let db_pool = match &config.database.url {
        Some(url) => {
            let pool = db::create_pool(url)
                .await
                .context("Failed to initialize database")?;
            tracing::info!("HITL database initialized");
            Some(pool)
        }
        None => {
            tracing::info!("DATABASE_URL not set, skipping HITL schema provisioning");
            None
        }
    };

    let app_state = AppState::new(config.clone(), extraction, db_pool);
    let app = routes::router(app_state.clone());

    // Start server with graceful shutdown
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Invoice Extract Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(pool) = app_state.db() {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
