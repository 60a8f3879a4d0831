//! `vectra` binary: parses CLI configuration, builds the catalog + index +
//! chunker + embedder, and serves the HTTP surface defined in
//! [`vectra::http`].

use std::sync::Arc;

use clap::Parser;
use vectra::config::{Cli, Config};
use vectra::embedder::{EmbeddingClient, Embedder};
use vectra::index::build_index;
use vectra::{chunker::Chunker, http, service::Service};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_cli(cli)?;

    tracing::info!(
        index_kind = ?config.index_kind,
        bind = %config.bind,
        "starting vectra"
    );

    let index = build_index(config.index_kind, config.lsh_params.clone());
    let embedder: Arc<dyn EmbeddingClient> = Arc::new(Embedder::new(config.api_key)?);
    let chunker = Chunker::new(config.chunking_strategy);
    let service = Arc::new(Service::new(index, embedder, chunker));

    let app = http::router(service);
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
