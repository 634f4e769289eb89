use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dataset_core::SourceFormat;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::normalize::{normalize, NormalizeError};
use crate::Record;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("output path has no file name: {0:?}")]
    InvalidPath(PathBuf),
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("persisted file is not a record array: {0}")]
    Corrupt(#[from] NormalizeError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing. Safe to call repeatedly.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // rename(2) replaces the target in one step; readers see old or new, never half.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Write records as one pretty-printed JSON array, replacing any previous file.
/// Returns the number of bytes written.
pub fn write_records(path: &Path, records: &[Record]) -> Result<u64, PersistError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PersistError::InvalidPath(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let content = serde_json::to_string_pretty(records)?;
    AtomicFileWriter::new(dir).write(filename, &content)?;
    Ok(content.len() as u64)
}

/// Read a file produced by [`write_records`] back into records.
pub fn read_records(path: &Path) -> Result<Vec<Record>, PersistError> {
    let text = fs::read_to_string(path)?;
    Ok(normalize(&text, SourceFormat::JsonArray)?)
}
