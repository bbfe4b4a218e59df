//! Newline-delimited JSON persistence for [`EmbeddingRecord`]s.
//!
//! One record per line: `{id, name, kind, metadata, embedding}`. The file
//! is append-only; the indexer adds one batch at a time and the
//! [`VectorIndex`](crate::index::VectorIndex) reads the whole file at load.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::EmbeddingRecord;

/// Appends records to a JSONL index file.
pub struct IndexWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl IndexWriter {
    /// Open `path` for appending, creating it and its parent directories if
    /// needed.
    ///
    /// An unterminated last line, left behind by a run killed mid-write, is
    /// cut off so appends start on a clean line.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if path.exists() {
            truncate_torn_tail(path)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a batch and flush it.
    ///
    /// The whole batch is serialized before anything is written, so a
    /// serialization failure leaves the file untouched.
    pub fn append_batch(&mut self, records: &[EmbeddingRecord]) -> Result<()> {
        let mut buf = String::new();
        for record in records {
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
        }
        self.writer.write_all(buf.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Drop trailing bytes after the last newline.
fn truncate_torn_tail(path: &Path) -> Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(());
    }

    file.seek(SeekFrom::Start(0))?;
    let mut content = Vec::with_capacity(len as usize);
    file.read_to_end(&mut content)?;
    let keep = content
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);

    warn!(
        path = %path.display(),
        dropped_bytes = len - keep as u64,
        "truncating unterminated last line of index"
    );
    file.set_len(keep as u64)?;
    Ok(())
}

/// Read every record from a JSONL index file. Blank lines are skipped.
pub fn read_records(path: &Path) -> Result<Vec<EmbeddingRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: EmbeddingRecord =
            serde_json::from_str(&line).map_err(|e| Error::InvalidRecord {
                line: i + 1,
                message: e.to_string(),
            })?;
        records.push(record);
    }

    Ok(records)
}

#[derive(Deserialize)]
struct RecordId {
    id: String,
}

/// Vector dimension of the first record, or `None` for a missing or empty
/// file.
pub fn read_dims(path: &Path) -> Result<Option<usize>> {
    if !path.exists() {
        return Ok(None);
    }

    let reader = BufReader::new(File::open(path)?);
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let rec: RecordEmbedding =
            serde_json::from_str(&line).map_err(|e| Error::InvalidRecord {
                line: i + 1,
                message: e.to_string(),
            })?;
        return Ok(Some(rec.embedding.len()));
    }
    Ok(None)
}

#[derive(Deserialize)]
struct RecordEmbedding {
    embedding: Vec<f32>,
}

/// Ids already present in an index file; empty if the file does not exist.
///
/// Used to resume an interrupted indexing run.
pub fn read_ids(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut ids = HashSet::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let rec: RecordId = serde_json::from_str(&line).map_err(|e| Error::InvalidRecord {
            line: i + 1,
            message: e.to_string(),
        })?;
        ids.insert(rec.id);
    }
    Ok(ids)
}
