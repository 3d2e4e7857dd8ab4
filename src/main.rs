// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use build_telemetry::application::feed_service::FeedService;
use build_telemetry::application::ingest_service::IngestService;
use build_telemetry::infrastructure::config::load_config;
use build_telemetry::infrastructure::disk_store::DiskFeedStore;
use build_telemetry::presentation::app_state::AppState;
use build_telemetry::presentation::handlers::{commit_record, health_check, summary_feed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_config()?;

    // Create the feed store (infrastructure layer)
    let store = Arc::new(DiskFeedStore::new(&config.feed.out_dir));

    // Process pending captures before serving
    if let Some(ingest) = &config.ingest {
        let service = IngestService::new(store.clone(), &ingest.capture_dir, ingest.simplify_area);
        let report = service.run().await?;
        tracing::info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "ingest pass complete"
        );
    }

    // Create services (application layer)
    let feed_service = FeedService::new(store);

    // Create application state
    let state = Arc::new(AppState { feed_service });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/summary.json", get(summary_feed))
        .route("/:file", get(commit_record))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server.listen))?;
    println!("Starting build-telemetry feed server on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
