use std::sync::Arc;

use smsgate_metrics::AppMetrics;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    cache::PredictionCache,
    classify::LexiconClassifier,
    config::Config,
    http::{AppState, router},
};

mod cache;
mod classify;
mod config;
mod error;
mod http;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(version = %config.version, cache = config.cache_enabled, "starting frontend");

    let state = AppState {
        metrics: Arc::new(AppMetrics::new(&config.version)?),
        cache: Arc::new(PredictionCache::new(config.cache_enabled)),
        classifier: Arc::new(LexiconClassifier::new()),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("listening on {}", config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("signal received, starting graceful shutdown");
}
