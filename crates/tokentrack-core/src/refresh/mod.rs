//! Refresh pipeline: a background task samples the configured source on a
//! fixed period and sends computed usage to the view over a channel.

pub mod events;
pub mod refresher;

pub use events::{ConnectionStatus, RefreshEvent, UsageDisplay};
pub use refresher::{RefreshHandle, Refresher};
