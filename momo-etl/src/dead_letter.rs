//! Dead-letter sinks for messages that failed extraction.
//!
//! Records are append-only and never read back by the pipeline.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use momo_core::DeadLetterRecord;

/// Destination for dead-letter records
pub trait DeadLetterSink {
    fn record(&mut self, record: &DeadLetterRecord) -> Result<()>;
}

/// Writes each record to `dead_letter_<YYYYmmddHHMMSS>.json` in a directory.
///
/// File names have second granularity: two failures inside the same second
/// land on the same path and the later one overwrites the earlier.
#[derive(Debug, Clone)]
pub struct DirDeadLetterSink {
    dir: PathBuf,
}

impl DirDeadLetterSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, record: &DeadLetterRecord) -> PathBuf {
        self.dir.join(format!("dead_letter_{}.json", record.stamp()))
    }
}

impl DeadLetterSink for DirDeadLetterSink {
    fn record(&mut self, record: &DeadLetterRecord) -> Result<()> {
        let path = self.path_for(record);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "message saved to dead letter queue");
        Ok(())
    }
}

/// Keeps records in memory (dry runs and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryDeadLetterSink {
    pub records: Vec<DeadLetterRecord>,
}

impl DeadLetterSink for MemoryDeadLetterSink {
    fn record(&mut self, record: &DeadLetterRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
