//! # Schema Compass CLI (`compass`)
//!
//! ## Usage
//!
//! ```bash
//! compass [--config ./compass.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `compass flatten <schema>` | Flatten a schema into documents without embedding |
//! | `compass index <schema>` | Embed a schema's documents and append them to the index |
//! | `compass query "<question>"` | Rank and constrain index entries for a question |
//! | `compass stats` | Show record counts and dimensions of an index |
//!
//! ## Examples
//!
//! ```bash
//! # Inspect the text that would be embedded
//! compass flatten schema.graphql --show-text
//!
//! # Build an index with smaller batches
//! compass index schema.graphql --out data/shop.jsonl --batch-size 16
//!
//! # Only keep the top hit and its direct children
//! compass query "price of a product variant" --index data/shop.jsonl --root-sibling
//!
//! # Force full traversal when the config selects another mode
//! compass query "price of a product variant" --mode traversal
//! ```
//!
//! Diagnostics go to stderr through `tracing`; set `RUST_LOG=info` to see
//! per-batch progress.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use schema_compass::config::{self, Config};
use schema_compass::expand::ConstraintMode;
use schema_compass::query_cmd::QueryOptions;
use schema_compass::{index_cmd, query_cmd, stats};

/// Schema Compass: natural-language retrieval over GraphQL schemas.
///
/// All commands accept an optional `--config` flag pointing to a TOML
/// configuration file. Without it, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "compass",
    about = "Schema Compass: natural-language retrieval over GraphQL schemas",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten a schema into one document per type→field pair.
    ///
    /// Nothing is embedded or written. Prints per-kind counts, or every
    /// document as JSON lines with `--json`.
    Flatten {
        /// Path to the SDL file.
        schema: PathBuf,

        /// Print each document as a JSON line.
        #[arg(long)]
        json: bool,

        /// Print the flattened text of each document.
        #[arg(long)]
        show_text: bool,
    },

    /// Embed a schema and append it to the index.
    ///
    /// Documents whose id is already in the output file are skipped, so an
    /// interrupted run can be restarted with the same arguments.
    Index {
        /// Path to the SDL file.
        schema: PathBuf,

        /// Output JSONL file (overrides `[index] path`).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Documents per provider call.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Pause between provider calls, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Embedding model.
        #[arg(long)]
        model: Option<String>,
    },

    /// Answer a question with a schema-connected set of fields.
    Query {
        /// The natural-language question.
        question: String,

        /// Index JSONL file (overrides `[index] path`).
        #[arg(long)]
        index: Option<PathBuf>,

        /// Embedding model; must match the one used to build the index.
        #[arg(long)]
        model: Option<String>,

        /// Number of results to return.
        #[arg(short = 'k', long = "top-k")]
        top_k: Option<i64>,

        /// Constraint mode: traversal, root-sibling, or raw (overrides
        /// `[retrieval] mode`).
        #[arg(long, value_name = "MODE", conflicts_with_all = ["root_sibling", "raw"])]
        mode: Option<ConstraintMode>,

        /// Keep only the top result and fields of the type it points at.
        /// Same as `--mode root-sibling`.
        #[arg(long, conflicts_with = "raw")]
        root_sibling: bool,

        /// Plain similarity order, no type-graph constraint. Same as
        /// `--mode raw`.
        #[arg(long)]
        raw: bool,

        /// Print results as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics.
    Stats {
        /// Index JSONL file (overrides `[index] path`).
        #[arg(long)]
        index: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    config::load_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("invalid configuration in {}", path.display()),
        None => "invalid default configuration".to_string(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut cfg = load_config(&cli)?;

    match cli.command {
        Commands::Flatten {
            schema,
            json,
            show_text,
        } => {
            index_cmd::run_flatten(&schema, json, show_text)?;
        }
        Commands::Index {
            schema,
            out,
            batch_size,
            delay_ms,
            model,
        } => {
            if let Some(out) = out {
                cfg.index.path = out;
            }
            if let Some(batch_size) = batch_size {
                anyhow::ensure!(batch_size > 0, "--batch-size must be > 0");
                cfg.embedding.batch_size = batch_size;
            }
            if let Some(delay_ms) = delay_ms {
                cfg.embedding.batch_delay_ms = delay_ms;
            }
            if let Some(model) = model {
                cfg.embedding.model = model;
            }
            index_cmd::run_index(&cfg, &schema).await?;
        }
        Commands::Query {
            question,
            index,
            model,
            top_k,
            mode,
            root_sibling,
            raw,
            json,
        } => {
            if let Some(index) = index {
                cfg.index.path = index;
            }
            if let Some(model) = model {
                cfg.embedding.model = model;
            }
            let mode = if root_sibling {
                Some(ConstraintMode::RootSibling)
            } else if raw {
                Some(ConstraintMode::Raw)
            } else {
                mode
            };
            let opts = QueryOptions { top_k, mode, json };
            query_cmd::run_query(&cfg, &question, &opts).await?;
        }
        Commands::Stats { index } => {
            if let Some(index) = index {
                cfg.index.path = index;
            }
            stats::run_stats(&cfg)?;
        }
    }

    Ok(())
}
