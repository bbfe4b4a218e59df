//! `compass query`: embed a question, rank the whole index, and constrain
//! the ranking to a schema-connected subset.
//!
//! The index is scored in full (`k = len`) before constraining, so the
//! expander sees every candidate child and not only the raw top-K.

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::embedding;
use crate::expand::{self, ConstraintMode};
use crate::index::VectorIndex;
use crate::report;

/// Query overrides from the command line. `None` falls back to config.
#[derive(Debug, Default, Clone)]
pub struct QueryOptions {
    pub top_k: Option<i64>,
    pub mode: Option<ConstraintMode>,
    pub json: bool,
}

impl QueryOptions {
    /// The mode to run: the command-line choice, else `[retrieval] mode`.
    pub fn resolve_mode(&self, config: &Config) -> ConstraintMode {
        self.mode.unwrap_or(config.retrieval.mode)
    }
}

pub async fn run_query(config: &Config, question: &str, opts: &QueryOptions) -> Result<()> {
    if question.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let top_k = opts.top_k.unwrap_or(config.retrieval.top_k);
    if top_k < 1 {
        bail!("-k must be >= 1, got {}", top_k);
    }
    let mode = opts.resolve_mode(config);

    let index_path = &config.index.path;
    let index = VectorIndex::load(index_path)
        .with_context(|| format!("failed to load index {}", index_path.display()))?;

    if index.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let provider = embedding::create_provider(&config.embedding)?;
    let query_vec = embedding::embed_query(provider.as_ref(), question)
        .await
        .context("failed to embed query")?;

    let ranked = index.retrieve(&query_vec, index.len() as i64)?;
    let results = expand::constrain(&ranked, top_k as usize, mode);

    if opts.json {
        println!("{}", report::render_json(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    print!(
        "{}",
        report::render_ranked(&results, config.retrieval.snippet_chars)
    );
    println!("Result tree ({} mode):", mode);
    print!("{}", report::render_tree(&results));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_config() -> Config {
        let mut config = Config::default();
        config.retrieval.mode = ConstraintMode::Raw;
        config
    }

    #[test]
    fn test_command_line_mode_overrides_config() {
        let opts = QueryOptions {
            mode: Some(ConstraintMode::Traversal),
            ..QueryOptions::default()
        };
        assert_eq!(opts.resolve_mode(&raw_config()), ConstraintMode::Traversal);
    }

    #[test]
    fn test_config_mode_used_without_override() {
        let opts = QueryOptions::default();
        assert_eq!(opts.resolve_mode(&raw_config()), ConstraintMode::Raw);
        assert_eq!(
            opts.resolve_mode(&Config::default()),
            ConstraintMode::Traversal
        );
    }
}
