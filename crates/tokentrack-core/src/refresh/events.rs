//! Events sent from the refresher to the view, and the view model they update.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::config::SourceKind;
use crate::source::Unavailable;
use crate::usage::UsageView;

/// Connection state shown in the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No sample has arrived yet
    Connecting,
    /// Last sample succeeded
    Connected,
    /// Last sample failed
    ConnectionError,
}

impl ConnectionStatus {
    /// Human-readable status text
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "✓ Connected",
            ConnectionStatus::ConnectionError => "Connection error",
        }
    }
}

/// Message sent from the refresher to the view
#[derive(Debug, Clone)]
pub enum RefreshEvent {
    /// A fresh view computed from a successful sample
    Update {
        view: UsageView,
        status: ConnectionStatus,
        at: DateTime<Local>,
    },
    /// The source was unavailable this cycle
    Error {
        status: ConnectionStatus,
        reason: Unavailable,
    },
}

/// View model owned by the UI, mutated only through [`UsageDisplay::apply`]
#[derive(Debug, Clone)]
pub struct UsageDisplay {
    /// Last good usage view; kept across errors
    pub view: Option<UsageView>,
    /// Current connection status
    pub status: ConnectionStatus,
    /// When `view` was last replaced
    pub last_update: Option<DateTime<Local>>,
    /// Reason of the most recent failure, cleared on success
    pub last_error: Option<String>,
}

impl UsageDisplay {
    /// Empty display with the given initial status
    pub fn new(status: ConnectionStatus) -> Self {
        Self {
            view: None,
            status,
            last_update: None,
            last_error: None,
        }
    }

    /// Initial display for a source: the gateway starts out connecting, the
    /// counter file is local and starts out connected
    pub fn for_source(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Remote => Self::new(ConnectionStatus::Connecting),
            SourceKind::File => Self::new(ConnectionStatus::Connected),
        }
    }

    /// Apply an event from the refresher
    pub fn apply(&mut self, event: RefreshEvent) {
        match event {
            RefreshEvent::Update { view, status, at } => {
                self.view = Some(view);
                self.status = status;
                self.last_update = Some(at);
                self.last_error = None;
            }
            RefreshEvent::Error { status, reason } => {
                self.status = status;
                self.last_error = Some(reason.to_string());
            }
        }
    }
}
