use anyhow::{Context, Result};
use gci_admin::{api, backend, cache, config, handlers, pages, AppState};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gci_admin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = config::Config::from_env().context("Failed to load configuration")?;

    // The cache lives for the whole process and is torn down after serving
    let cache = Arc::new(cache::QueryCache::new());
    let records = pages::Records::new(
        api::RecordClient::new(config.api_base_url.clone()),
        cache.clone(),
        config.render_wait,
    );
    tracing::info!("Using API at {}", records.client.base_url());
    let state = Arc::new(AppState::new(records));

    let mut app = handlers::router(state);
    if config.embed_backend {
        tracing::info!("Serving embedded in-memory API under /api");
        app = app.nest("/api", backend::router(backend::Store::default()));
    }
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache.shutdown();
    tracing::info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
