mod init;
mod server;

use std::sync::Arc;

use rmcp::ServiceExt;
use routebook_core::RoutebookConfig;
use tracing_subscriber::EnvFilter;

use crate::server::RoutebookServer;

const SERVER_NAME: &str = "routebook";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = RoutebookConfig::load()?;

    if std::env::args().nth(1).as_deref() == Some("init") {
        let clients = init::run(&config)?;
        let labels: Vec<&str> = clients.iter().map(|c| c.label()).collect();
        eprintln!("\nDone. {} will use routebook in this project.", labels.join(" and "));
        return Ok(());
    }

    init_tracing(&config.log_filter);
    tracing::info!(data_dir = %config.data_dir.display(), "starting routebook MCP server");

    let store = Arc::new(config.file_store());
    let service = RoutebookServer::new(store, config.seed_samples)
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "MCP server error"))?;
    service.waiting().await?;
    Ok(())
}

/// Log to stderr; stdout carries the protocol. `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
