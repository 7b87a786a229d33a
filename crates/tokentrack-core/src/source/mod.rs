//! Count sources: where the sampler gets the current token count from.
//!
//! Two strategies share the [`UsageSource`] trait:
//! - [`RemoteSource`] asks the gateway over JSON-RPC and reports failures as
//!   [`Unavailable`].
//! - [`FileSource`] reads the counter file and treats any failure as zero.

pub mod file;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{Settings, SourceKind};
use crate::usage::UsageSample;

pub use file::FileSource;
pub use remote::{RemoteSource, RpcRequest, SessionStatus};

/// The source could not produce a count this cycle
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Unavailable {
    /// Connection refused, DNS failure, timeout, ...
    #[error("transport error: {0}")]
    Transport(String),

    /// Gateway answered with a non-success HTTP status
    #[error("gateway returned HTTP {0}")]
    Status(u16),

    /// Gateway answered with a JSON-RPC error object
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Body was not the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The sampling task itself died
    #[error("sampler task failed: {0}")]
    TaskFailed(String),
}

/// A strategy for obtaining the current token count.
///
/// `sample` may block (file or network I/O); callers in async code run it on
/// the blocking pool.
pub trait UsageSource: Send + Sync {
    /// Take one sample. One attempt, no retry.
    fn sample(&self) -> Result<UsageSample, Unavailable>;

    /// Short name for logs and the status line
    fn name(&self) -> &'static str;

    /// Polling period used when the settings do not override it
    fn default_interval(&self) -> Duration;
}

/// Build the source selected in the settings
pub fn from_settings(settings: &Settings) -> Arc<dyn UsageSource> {
    match settings.source {
        SourceKind::Remote => Arc::new(RemoteSource::new(&settings.gateway)),
        SourceKind::File => Arc::new(FileSource::new(settings.counter.path.clone())),
    }
}
