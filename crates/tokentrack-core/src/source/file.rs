//! Counter-file strategy: read `{"tokens": N}` from disk.
//!
//! Unlike the gateway, a missing or unreadable file is not an outage: it
//! means nothing has been counted yet, so it samples as zero.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use super::{Unavailable, UsageSource};
use crate::counter::CounterFile;
use crate::usage::UsageSample;

/// Samples the token count from the counter file
pub struct FileSource {
    counter: CounterFile,
}

impl FileSource {
    /// Polling period for the counter file
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    /// Create a source reading the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            counter: CounterFile::new(path),
        }
    }

    /// Path being read
    pub fn path(&self) -> &Path {
        self.counter.path()
    }

    /// Current count, with every read failure folded into zero
    pub fn read_count(&self) -> u64 {
        if !self.counter.exists() {
            debug!("Counter file {:?} not found, counting 0", self.path());
            return 0;
        }

        match self.counter.read() {
            Ok(record) => record.tokens,
            Err(e) => {
                warn!("Error reading counter file: {:#}", e);
                0
            }
        }
    }
}

impl UsageSource for FileSource {
    fn sample(&self) -> Result<UsageSample, Unavailable> {
        Ok(UsageSample::now(self.read_count()))
    }

    fn name(&self) -> &'static str {
        "file"
    }

    fn default_interval(&self) -> Duration {
        Self::DEFAULT_INTERVAL
    }
}
