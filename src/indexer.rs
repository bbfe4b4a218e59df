//! Batched embedding of [`FieldDoc`]s into an append-only index file.
//!
//! Documents are split into fixed-size batches; each batch is one provider
//! call, followed by a fixed delay before the next to stay under provider
//! rate limits. A batch is written only after its response has been fully
//! validated, so a failure never leaves a partial or misaligned batch on
//! disk. Ids already in the output file are skipped, which lets an
//! interrupted run pick up where it stopped.

use std::time::Duration;
use tracing::{info, warn};

use crate::config::EmbeddingConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::models::{EmbeddingRecord, FieldDoc};
use crate::store::{self, IndexWriter};

/// Batching parameters for [`EmbeddingIndexer`].
#[derive(Debug, Clone)]
pub struct IndexerOptions {
    pub batch_size: usize,
    pub batch_delay: Duration,
    /// When set, every returned vector must have this length.
    pub expected_dims: Option<usize>,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            batch_size: 64,
            batch_delay: Duration::from_millis(600),
            expected_dims: None,
        }
    }
}

impl IndexerOptions {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            batch_delay: config.batch_delay(),
            expected_dims: config.dims,
        }
    }
}

/// Counts from one indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub total: usize,
    /// Already present in the output file.
    pub skipped: usize,
    pub embedded: usize,
    pub batches: usize,
}

pub struct EmbeddingIndexer<'a> {
    provider: &'a dyn EmbeddingProvider,
    options: IndexerOptions,
}

impl<'a> EmbeddingIndexer<'a> {
    pub fn new(provider: &'a dyn EmbeddingProvider, options: IndexerOptions) -> Self {
        Self { provider, options }
    }

    /// Embed every document not yet in `writer`'s file and append the
    /// records, batch by batch.
    ///
    /// # Errors
    ///
    /// - [`Error::Provider`] if a call fails or returns a vector count that
    ///   differs from the number of texts sent. Nothing from that batch is
    ///   written; earlier batches stay on disk.
    /// - [`Error::SchemaMismatch`] if a returned vector's dimension differs
    ///   from the expected dimension, the dimension already in the file, or
    ///   the first dimension seen in this run.
    pub async fn index(
        &self,
        docs: &[FieldDoc],
        writer: &mut IndexWriter,
    ) -> Result<IndexReport> {
        let batch_size = self.options.batch_size.max(1);
        let existing = store::read_ids(writer.path())?;
        let pending: Vec<&FieldDoc> = docs
            .iter()
            .filter(|d| !existing.contains(&d.id))
            .collect();

        let mut report = IndexReport {
            total: docs.len(),
            skipped: docs.len() - pending.len(),
            ..IndexReport::default()
        };

        if report.skipped > 0 {
            info!(
                skipped = report.skipped,
                remaining = pending.len(),
                "resuming: documents already indexed"
            );
        }

        let mut dims = self.options.expected_dims;
        if !existing.is_empty() {
            if let Some(persisted) = store::read_dims(writer.path())? {
                if let Some(expected) = dims.filter(|&e| e != persisted) {
                    return Err(Error::SchemaMismatch {
                        context: format!("existing index {}", writer.path().display()),
                        expected,
                        actual: persisted,
                    });
                }
                dims = Some(persisted);
            }
        }

        for (batch_idx, batch) in pending.chunks(batch_size).enumerate() {
            if batch_idx > 0 && !self.options.batch_delay.is_zero() {
                tokio::time::sleep(self.options.batch_delay).await;
            }

            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let vectors = self
                .provider
                .embed(&texts)
                .await
                .map_err(|e| e.with_batch(batch_idx))?;

            if vectors.len() != texts.len() {
                warn!(
                    batch = batch_idx,
                    sent = texts.len(),
                    received = vectors.len(),
                    "provider returned misaligned batch"
                );
                return Err(Error::provider(
                    batch_idx,
                    format!(
                        "expected {} vectors, received {}",
                        texts.len(),
                        vectors.len()
                    ),
                ));
            }

            for (doc, vector) in batch.iter().zip(vectors.iter()) {
                match dims {
                    Some(expected) if expected != vector.len() => {
                        return Err(Error::SchemaMismatch {
                            context: format!("batch {} document {}", batch_idx, doc.id),
                            expected,
                            actual: vector.len(),
                        });
                    }
                    Some(_) => {}
                    None => dims = Some(vector.len()),
                }
            }

            let records: Vec<EmbeddingRecord> = batch
                .iter()
                .zip(vectors)
                .map(|(doc, vector)| EmbeddingRecord::from_doc(doc, vector))
                .collect();
            writer.append_batch(&records)?;

            report.embedded += records.len();
            report.batches += 1;
            info!(
                batch = batch_idx,
                embedded = report.embedded,
                pending = pending.len(),
                "batch written"
            );
        }

        Ok(report)
    }
}
