//! Polyline point-in-polygon server
//!
//! Run with: `cargo run -- --help`

use std::sync::Arc;

use clap::Parser;
use pip_polyline::config::ServerConfig;
use pip_polyline::filter::QueryFilterParser;
use pip_polyline::geojson::PointFeatureAdapter;
use pip_polyline::pipeline::PolylinePipeline;
use pip_polyline::remote::RemoteIndex;
use pip_polyline::server::build_router;
use pip_polyline::telemetry::{init_logging, TelemetryConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::parse();
    init_logging(&TelemetryConfig::with_server_config(&config));

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.listen_addr,
        upstream = %config.upstream_url,
        allow_geojson = config.allow_geojson,
        max_coords = config.max_coords,
        "Starting polyline server"
    );

    // The blocking HTTP client must be built and dropped outside the async
    // runtime, so the pipeline is owned here rather than inside `serve`.
    let index = RemoteIndex::new(config.remote_index_config())?;
    let pipeline = Arc::new(PolylinePipeline::new(
        index,
        QueryFilterParser,
        PointFeatureAdapter,
        config.polyline_options(),
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config, Arc::clone(&pipeline)))?;
    drop(runtime);

    Ok(())
}

async fn serve(
    config: ServerConfig,
    pipeline: Arc<PolylinePipeline<RemoteIndex, QueryFilterParser, PointFeatureAdapter>>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "listening");

    axum::serve(listener, build_router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
