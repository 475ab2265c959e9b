//! Background task that periodically removes expired links.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::application::services::LinkService;
use crate::domain::repositories::LinkStore;
use crate::error::AppError;

/// Periodic driver of [`LinkService::sweep_expired`].
///
/// The first sweep runs as soon as the task starts, then once per interval.
/// A slow sweep delays the following ticks instead of bunching them up.
pub struct ExpirySweeper<S: LinkStore + 'static> {
    service: Arc<LinkService<S>>,
    interval: Duration,
}

impl<S: LinkStore + 'static> ExpirySweeper<S> {
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `interval` is zero.
    pub fn new(service: Arc<LinkService<S>>, interval: Duration) -> Result<Self, AppError> {
        if interval.is_zero() {
            return Err(AppError::bad_request(
                "Sweep interval must be greater than zero",
                json!({ "interval_ms": 0 }),
            ));
        }
        Ok(Self { service, interval })
    }

    /// Spawns the sweeper onto the current tokio runtime.
    ///
    /// Dropping the returned handle without calling [`SweeperHandle::stop`]
    /// also ends the task after its current sweep.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        SweeperHandle { shutdown_tx, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "Expiry sweeper started");

        loop {
            // The sweep runs in the branch body, outside the select, so a
            // shutdown signal never cancels a sweep halfway.
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => self.sweep_once().await,
            }
        }

        info!("Expiry sweeper stopped");
    }

    async fn sweep_once(&self) {
        match self.service.sweep_expired().await {
            Ok(0) => {}
            Ok(removed) => debug!(removed, "Expiry sweep finished"),
            Err(e) => warn!(error = %e, code = e.code(), "Expiry sweep failed"),
        }
    }
}

/// Handle to a running [`ExpirySweeper`].
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops future sweeps and waits for the task to exit.
    ///
    /// A sweep already in progress is allowed to finish first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the sweeper task panicked.
    pub async fn stop(self) -> Result<(), AppError> {
        // Err means the task already exited and dropped its receiver.
        let _ = self.shutdown_tx.send(true);
        self.task.await.map_err(|e| {
            AppError::internal("Expiry sweeper task failed", json!({ "reason": e.to_string() }))
        })
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
