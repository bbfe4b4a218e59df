//! Index statistics and health overview.
//!
//! Loads the index (which validates vector dimensions) and prints record
//! counts, the shared dimension, and per-kind and per-type breakdowns. Used
//! by `compass stats` to confirm an indexing run produced what was expected.

use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::config::Config;
use crate::index::VectorIndex;

/// Counts derived from a loaded index.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub records: usize,
    pub dims: usize,
    /// Owning-type kind → record count. Records with no readable kind are
    /// counted under `"unknown"`.
    pub by_kind: BTreeMap<String, usize>,
    /// Owning type name → record count.
    pub by_type: BTreeMap<String, usize>,
}

pub fn collect_stats(index: &VectorIndex) -> IndexStats {
    let mut stats = IndexStats {
        records: index.len(),
        dims: index.dims(),
        ..IndexStats::default()
    };

    for record in index.records() {
        let kind = record
            .metadata
            .type_kind
            .map(|k| k.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        *stats.by_kind.entry(kind).or_default() += 1;
        *stats
            .by_type
            .entry(record.metadata.type_name.clone())
            .or_default() += 1;
    }

    stats
}

/// Run the stats command: load the index and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let path = &config.index.path;
    let index = VectorIndex::load(path)
        .with_context(|| format!("failed to load index {}", path.display()))?;
    let stats = collect_stats(&index);

    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("Schema Compass Index Stats");
    println!("==========================");
    println!();
    println!("  Index:       {}", path.display());
    println!("  Size:        {}", format_bytes(size));
    println!();
    println!("  Records:     {}", stats.records);
    println!("  Dimensions:  {}", stats.dims);
    println!("  Types:       {}", stats.by_type.len());

    if !stats.by_kind.is_empty() {
        println!();
        println!("  By kind:");
        println!("  {:<16} {:>8}", "KIND", "FIELDS");
        println!("  {}", "-".repeat(25));
        for (kind, count) in &stats.by_kind {
            println!("  {:<16} {:>8}", kind, count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
