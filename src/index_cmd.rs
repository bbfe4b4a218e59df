//! `compass flatten` and `compass index`.
//!
//! Both commands read an SDL file and flatten it; `index` then embeds the
//! documents and appends them to the JSONL index.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::embedding;
use crate::flatten;
use crate::indexer::{EmbeddingIndexer, IndexerOptions};
use crate::models::{FieldDoc, TypeKind};
use crate::sdl;
use crate::store::IndexWriter;

fn load_docs(schema_path: &Path) -> Result<Vec<FieldDoc>> {
    let sdl_text = std::fs::read_to_string(schema_path)
        .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
    let registry = sdl::parse_schema(&sdl_text)
        .with_context(|| format!("failed to parse schema {}", schema_path.display()))?;
    Ok(flatten::flatten_schema(&registry))
}

/// Flatten a schema without embedding anything.
pub fn run_flatten(schema_path: &Path, json: bool, show_text: bool) -> Result<()> {
    let docs = load_docs(schema_path)?;

    if json {
        for doc in &docs {
            println!("{}", serde_json::to_string(doc)?);
        }
        return Ok(());
    }

    if show_text {
        for doc in &docs {
            println!("=== {} ===", doc.id);
            println!("{}", doc.text);
            println!();
        }
    }

    let count = |kind: TypeKind| {
        docs.iter()
            .filter(|d| d.metadata.type_kind == Some(kind))
            .count()
    };

    println!("flatten {}", schema_path.display());
    println!("  documents: {}", docs.len());
    println!("    object fields:    {}", count(TypeKind::Object));
    println!("    interface fields: {}", count(TypeKind::Interface));
    println!("    input fields:     {}", count(TypeKind::Input));
    println!(
        "  with referenced-type digest: {}",
        docs.iter()
            .filter(|d| d.metadata.referenced.is_some())
            .count()
    );
    Ok(())
}

/// Flatten, embed, and append a schema to the configured index file.
pub async fn run_index(config: &Config, schema_path: &Path) -> Result<()> {
    if !config.embedding.is_enabled() {
        bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let docs = load_docs(schema_path)?;
    let provider = embedding::create_provider(&config.embedding)?;
    let out_path = &config.index.path;

    let mut writer = IndexWriter::open(out_path)
        .with_context(|| format!("failed to open index {}", out_path.display()))?;
    let indexer = EmbeddingIndexer::new(
        provider.as_ref(),
        IndexerOptions::from_config(&config.embedding),
    );

    let report = indexer
        .index(&docs, &mut writer)
        .await
        .with_context(|| format!("indexing into {} stopped", out_path.display()))?;

    println!("index {}", schema_path.display());
    println!("  model: {}", provider.model_name());
    println!("  output: {}", out_path.display());
    println!("  documents: {}", report.total);
    println!("  already indexed: {}", report.skipped);
    println!("  embedded: {}", report.embedded);
    println!("  batches: {}", report.batches);
    Ok(())
}
