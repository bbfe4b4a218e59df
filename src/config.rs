//! TOML configuration.
//!
//! Every section is optional; a missing file or section falls back to the
//! defaults below, so `compass` works without any config at all as long as
//! the provider credential is present in the environment.
//!
//! ```toml
//! [index]
//! path = "data/index.jsonl"
//!
//! [embedding]
//! provider = "openai"
//! model = "text-embedding-3-small"
//! batch_size = 64
//! batch_delay_ms = 600
//!
//! [retrieval]
//! top_k = 10
//! mode = "traversal"   # or "root-sibling", "raw"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::expand::ConstraintMode;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("data/index.jsonl")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Expected vector dimensionality; checked against provider output
    /// when set.
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dims: None,
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_batch_delay_ms() -> u64 {
    600
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default)]
    pub mode: ConstraintMode,
    /// Characters of description / SDL shown per result.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            mode: ConstraintMode::default(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

fn default_top_k() -> i64 {
    10
}
fn default_snippet_chars() -> usize {
    800
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!(
            "failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Configuration(format!("failed to parse config file: {}", e)))?;

    validate(&config)?;
    Ok(config)
}

/// Load `path` if given, otherwise return validated defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.embedding.batch_size == 0 {
        return Err(Error::Configuration(
            "embedding.batch_size must be > 0".to_string(),
        ));
    }

    if config.embedding.dims == Some(0) {
        return Err(Error::Configuration(
            "embedding.dims must be > 0 when set".to_string(),
        ));
    }

    if config.retrieval.top_k < 1 {
        return Err(Error::Configuration(
            "retrieval.top_k must be >= 1".to_string(),
        ));
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => {
            return Err(Error::Configuration(format!(
                "unknown embedding provider: '{}'. Must be disabled or openai.",
                other
            )))
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("compass.toml");
        fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_defaults() {
        let cfg = load_or_default(None).unwrap();
        assert_eq!(cfg.embedding.batch_size, 64);
        assert_eq!(cfg.embedding.batch_delay(), Duration::from_millis(600));
        assert_eq!(cfg.embedding.model, "text-embedding-3-small");
        assert_eq!(cfg.retrieval.top_k, 10);
        assert_eq!(cfg.retrieval.mode, ConstraintMode::Traversal);
        assert_eq!(cfg.index.path, PathBuf::from("data/index.jsonl"));
    }

    #[test]
    fn test_partial_file() {
        let (_tmp, path) = write_config(
            r#"
[embedding]
batch_size = 16

[retrieval]
mode = "root-sibling"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.embedding.batch_size, 16);
        assert_eq!(cfg.embedding.provider, "openai");
        assert_eq!(cfg.retrieval.mode, ConstraintMode::RootSibling);
        assert_eq!(cfg.retrieval.top_k, 10);
    }

    #[test]
    fn test_rejects_zero_batch() {
        let (_tmp, path) = write_config("[embedding]\nbatch_size = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let (_tmp, path) = write_config("[embedding]\nprovider = \"cohere\"\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("cohere"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/compass.toml")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
