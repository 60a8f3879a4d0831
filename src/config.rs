//! Startup configuration: index/chunker selection and the `vectra serve` CLI.
//!
//! Exactly one [`crate::index::IndexKind`] and one chunking strategy are
//! chosen per process, at startup, and never change for the life of the
//! server. An unrecognized token for either is a fatal
//! [`VectraError::Config`] before the server ever binds a port.

use clap::{Parser, ValueEnum};

use crate::chunker::ChunkingStrategy;
use crate::error::{Result, VectraError};
use crate::index::IndexKind;
use crate::index::lsh::LshParams;

/// `vectra serve` — start the HTTP server.
#[derive(Parser, Debug)]
#[command(name = "vectra", version, about = "In-memory vector search for RAG workloads")]
pub struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Which vector index implementation to instantiate.
    #[arg(long, value_enum, default_value = "brute-force")]
    pub index: IndexArg,

    /// Which chunking strategy documents are split with.
    #[arg(long, value_enum, default_value = "fixed")]
    pub chunker: ChunkerArg,

    /// Characters per chunk, for the fixed-size chunker.
    #[arg(long, default_value_t = 200)]
    pub chunk_size: usize,

    /// Number of LSH hash tables (only used when `--index lsh`).
    #[arg(long, default_value_t = 5)]
    pub lsh_tables: usize,

    /// Number of hyperplanes (hash bits) per LSH table.
    #[arg(long, default_value_t = 10)]
    pub lsh_hashes: usize,

    /// Embedding provider API key. Falls back to `COHERE_API_KEY` if unset.
    #[arg(long)]
    pub api_key: Option<String>,
}

/// CLI-facing mirror of [`IndexKind`], exposing its configuration tokens
/// (`"brute force"`, `"kd tree"`, `"lsh"`) as kebab-case flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexArg {
    #[value(name = "brute-force")]
    BruteForce,
    #[value(name = "kd-tree")]
    KdTree,
    #[value(name = "lsh")]
    Lsh,
}

impl From<IndexArg> for IndexKind {
    fn from(arg: IndexArg) -> Self {
        match arg {
            IndexArg::BruteForce => IndexKind::Exhaustive,
            IndexArg::KdTree => IndexKind::KdTree,
            IndexArg::Lsh => IndexKind::Lsh,
        }
    }
}

/// CLI-facing mirror of [`ChunkingStrategy`]'s two variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChunkerArg {
    Fixed,
    Sentence,
}

/// Resolved, validated process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub index_kind: IndexKind,
    pub lsh_params: LshParams,
    pub chunking_strategy: ChunkingStrategy,
    pub api_key: String,
}

impl Config {
    /// Resolve a [`Cli`] into a validated [`Config`], reading the embedding
    /// API key from `--api-key` or `COHERE_API_KEY`. Returns
    /// [`VectraError::Config`] if no key is available anywhere — a fatal
    /// startup error.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let api_key = match cli.api_key {
            Some(key) if !key.trim().is_empty() => key,
            _ => std::env::var("COHERE_API_KEY")
                .map_err(|_| VectraError::Config("COHERE_API_KEY is not set".into()))?,
        };

        let chunking_strategy = match cli.chunker {
            ChunkerArg::Fixed => ChunkingStrategy::FixedSize {
                chunk_size: cli.chunk_size.max(1),
            },
            ChunkerArg::Sentence => ChunkingStrategy::Sentence,
        };

        Ok(Self {
            bind: cli.bind,
            index_kind: cli.index.into(),
            lsh_params: LshParams {
                num_tables: cli.lsh_tables.max(1),
                num_hashes: cli.lsh_hashes.max(1),
            },
            chunking_strategy,
            api_key,
        })
    }
}
