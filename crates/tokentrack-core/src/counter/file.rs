//! Counter file management
//!
//! Holds the latest token count as `{"tokens": N, "updated": "<timestamp>"}`.
//! The one-shot writer replaces it; the display process only reads it.

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name used when no explicit path is configured
pub const COUNTER_FILE_NAME: &str = "token_count.json";

/// Contents of the counter file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    /// Latest cumulative token count
    pub tokens: u64,
    /// When the count was written (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl CounterRecord {
    /// Record stamped with the current local time
    pub fn now(tokens: u64) -> Self {
        Self {
            tokens,
            updated: Some(Local::now().to_rfc3339()),
        }
    }
}

/// Default counter file location: `<data-local-dir>/tokentrack/token_count.json`,
/// or `token_count.json` in the working directory when there is no data dir.
pub fn default_counter_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tokentrack").join(COUNTER_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(COUNTER_FILE_NAME))
}

/// Handle on a counter file at a fixed path
#[derive(Debug, Clone)]
pub struct CounterFile {
    path: PathBuf,
}

impl CounterFile {
    /// Create a handle for the given path (the file need not exist)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the counter file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the counter file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and parse the counter file
    pub fn read(&self) -> Result<CounterRecord> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read counter file: {:?}", self.path))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse counter file: {:?}", self.path))
    }

    /// Write `count` with a fresh timestamp
    pub fn write_count(&self, count: u64) -> Result<CounterRecord> {
        let record = CounterRecord::now(count);
        self.write(&record)?;
        Ok(record)
    }

    /// Write a record to the file.
    ///
    /// Uses atomic write with a temp file in the same directory so a reader
    /// never observes a half-written document.
    pub fn write(&self, record: &CounterRecord) -> Result<()> {
        let json = serde_json::to_string(record).context("Failed to serialize counter")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create counter directory: {:?}", parent))?;
        }

        let temp_path = self.temp_path();

        // Left over from a previous failed write
        let _ = fs::remove_file(&temp_path);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp counter file: {:?}", temp_path))?;

        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write temp counter file: {:?}", temp_path))?;

        file.sync_all()
            .with_context(|| format!("Failed to sync temp counter file: {:?}", temp_path))?;

        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename counter file: {:?}", self.path))?;

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| COUNTER_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
