//! Graph Dump Publisher Server

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use graphdump_publisher::producer::DumpProducer;
use graphdump_publisher::{http, AppState, Config, IsqlExporter, SparqlClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = Config::parse();
    let http_addr: SocketAddr = config.http_bind_addr.parse()?;

    let store = Arc::new(SparqlClient::new(&config.sparql_endpoint));
    let exporter = Arc::new(IsqlExporter::from_config(&config));

    if config.install_procedure {
        match exporter.install_procedure().await {
            Ok(()) => info!("Dump procedure installed"),
            Err(e) => warn!(error = %e, "Failed to install dump procedure"),
        }
    }

    let state = AppState::new(config, store, exporter);

    let dump_dir = DumpProducer::new(state.config.clone(), state.exporter.clone())
        .ensure_dump_dir()
        .await?;
    info!(
        subject = %state.config.dataset_subject,
        graph = %state.config.graph_to_dump,
        dump_dir = %dump_dir.display(),
        cleanup_old_dumps = state.config.cleanup_old_dumps,
        "Graph dump publisher configured"
    );

    let http_router = http::create_router(state);
    let http_listener = TcpListener::bind(http_addr).await?;
    info!("HTTP server listening on {}", http_addr);

    axum::serve(http_listener, http_router).await?;

    Ok(())
}
