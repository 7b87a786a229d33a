//! Background refresh loop: sample, compute, send to the view.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::events::{ConnectionStatus, RefreshEvent};
use crate::config::Settings;
use crate::source::{self, Unavailable, UsageSource};
use crate::usage::UsageCalculator;

/// Periodically samples a source and reports computed usage
pub struct Refresher {
    source: Arc<dyn UsageSource>,
    calculator: UsageCalculator,
    interval: Duration,
}

impl Refresher {
    /// Create a refresher
    pub fn new(
        source: Arc<dyn UsageSource>,
        calculator: UsageCalculator,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            calculator,
            interval,
        }
    }

    /// Build the source, calculator and interval from settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let source = source::from_settings(settings);
        let interval = settings.poll_interval(source.default_interval());
        Ok(Self::new(source, settings.calculator()?, interval))
    }

    /// Refresh period
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start refreshing in a background task
    pub fn start(self) -> RefreshHandle {
        let (tx, rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            self.run(tx, shutdown_rx).await;
        });

        RefreshHandle {
            rx,
            shutdown: shutdown_tx,
            task,
        }
    }

    /// Run the refresh loop until shutdown or until the receiver goes away
    async fn run(self, tx: mpsc::Sender<RefreshEvent>, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Refreshing from {} source every {:?}",
            self.source.name(),
            self.interval
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let source = Arc::clone(&self.source);
            let outcome = match tokio::task::spawn_blocking(move || source.sample()).await {
                Ok(outcome) => outcome,
                Err(e) => Err(Unavailable::TaskFailed(e.to_string())),
            };

            // The sample may have taken a while; drop it if we were told to stop
            if *shutdown.borrow() {
                debug!("Shutdown requested during sample, discarding result");
                break;
            }

            let event = match outcome {
                Ok(sample) => RefreshEvent::Update {
                    view: self.calculator.view_for(&sample),
                    status: ConnectionStatus::Connected,
                    at: Local::now(),
                },
                Err(reason) => {
                    warn!("Error fetching tokens: {}", reason);
                    RefreshEvent::Error {
                        status: ConnectionStatus::ConnectionError,
                        reason,
                    }
                }
            };

            if tx.send(event).await.is_err() {
                break; // Receiver dropped
            }
        }

        debug!("Refresh loop stopped");
    }
}

/// Handle on a running refresher: event receiver plus shutdown switch
pub struct RefreshHandle {
    rx: mpsc::Receiver<RefreshEvent>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Request shutdown. Safe to call any number of times.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether shutdown has been requested
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Next pending event without waiting; never yields after shutdown
    pub fn try_recv(&mut self) -> Option<RefreshEvent> {
        if self.is_shut_down() {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Wait for the next event; `None` once shut down or stopped
    pub async fn recv(&mut self) -> Option<RefreshEvent> {
        if self.is_shut_down() {
            return None;
        }
        let event = self.rx.recv().await?;
        if self.is_shut_down() {
            return None;
        }
        Some(event)
    }

    /// Request shutdown and wait for the loop to exit
    pub async fn join(self) {
        let RefreshHandle { rx, shutdown, task } = self;
        shutdown.send_replace(true);
        // Unblocks a loop waiting on a full channel
        drop(rx);
        if let Err(e) = task.await {
            warn!("Refresh task ended abnormally: {}", e);
        }
    }
}
