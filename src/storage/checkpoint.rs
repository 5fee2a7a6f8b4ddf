//! Snapshot checkpoints for resumable batches
//!
//! A checkpoint is the batch's whole output table, rewritten at every flush.
//! Writes go to a sibling temporary file that is then renamed over the
//! target, so a crash leaves either the previous snapshot or the new one.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ensure_parent, read_table, table_to_bytes};
use crate::models::RecordTable;

/// Output file doubling as the resume marker
#[derive(Debug, Clone)]
pub struct CheckpointFile {
    path: PathBuf,
    resume_column: String,
}

impl CheckpointFile {
    pub fn new(path: impl Into<PathBuf>, resume_column: &str) -> Self {
        Self {
            path: path.into(),
            resume_column: resume_column.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column whose values identify finished work items
    pub fn resume_column(&self) -> &str {
        &self.resume_column
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the previous snapshot, if any
    pub fn load(&self) -> Result<Option<RecordTable>> {
        if !self.exists() {
            return Ok(None);
        }
        let table = read_table(&self.path)?;
        tracing::info!(
            path = %self.path.display(),
            rows = table.len(),
            "Loaded checkpoint"
        );
        Ok(Some(table))
    }

    /// Keys already processed according to `table`
    pub fn done_keys(&self, table: &RecordTable) -> HashSet<String> {
        table.distinct(&self.resume_column)
    }

    /// Atomically replace the snapshot with `table`
    pub fn save(&self, table: &RecordTable) -> Result<()> {
        ensure_parent(&self.path)?;
        let bytes = table_to_bytes(table)?;

        // Write to temp file first, then rename (atomic)
        let temp_path = self.temp_path();
        fs::write(&temp_path, bytes).with_context(|| {
            format!("Failed to write checkpoint file: {}", temp_path.display())
        })?;
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!("Failed to rename checkpoint file: {}", self.path.display())
        })?;

        tracing::debug!(path = %self.path.display(), rows = table.len(), "Checkpoint saved");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
