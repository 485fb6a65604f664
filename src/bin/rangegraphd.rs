//! Binary entry point for the `rangegraphd` server.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use rangegraph::config::{Backend, Config};
use rangegraph::graph::Graph;
use rangegraph::store::buffered::{BufferedStore, MemSink};
use rangegraph::store::mem::MemStore;
use rangegraph::{http, logging};
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "rangegraphd", version, about = "A small property graph database server")]
struct Cli {
    /// Address to bind the HTTP surface to.
    #[arg(long, env = "RANGEGRAPH_LISTEN", default_value = "0.0.0.0:8231")]
    listen: SocketAddr,

    /// Name of the database instance.
    #[arg(long = "db", env = "RANGEGRAPH_DB", default_value = "rangegraph")]
    db_name: String,

    /// Storage backend to open.
    #[arg(long, value_enum, env = "RANGEGRAPH_BACKEND", default_value_t = Backend::Embedded)]
    backend: Backend,

    /// `tracing` env-filter directive.
    #[arg(long, env = "RANGEGRAPH_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config {
        listen_addr: cli.listen,
        db_name: cli.db_name,
        backend: cli.backend,
        log_level: cli.log_level,
    };

    logging::init(&config.log_level)?;

    let graph = match config.backend {
        Backend::Embedded => Graph::new(Arc::new(MemStore::new())),
        Backend::Buffered => {
            let store = BufferedStore::new(MemSink::new());
            store.start_workers().await;
            Graph::new(Arc::new(store))
        }
    };

    let app = http::router(graph);
    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, db = %config.db_name, backend = ?config.backend, "rangegraphd listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
