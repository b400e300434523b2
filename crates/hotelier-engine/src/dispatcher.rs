//! # Notification Dispatcher
//!
//! Delivers outbox entries written by committed bookings.
//!
//! ## Processing Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Dispatcher Processing Loop                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      tokio::select!                             │   │
//! │  │                                                                 │   │
//! │  │  interval.tick() ──┐                                            │   │
//! │  │  wake_rx.recv() ───┼──► deliver_pending()                       │   │
//! │  │                    │      get_pending(batch, max_attempts)      │   │
//! │  │                    │      for each entry:                       │   │
//! │  │                    │        notifier ok  → mark_delivered       │   │
//! │  │                    │        notifier err → mark_failed          │   │
//! │  │  shutdown_rx ──────┴──► break                                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Entries that used up max_attempts stay in the outbox for follow-up.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use hotelier_core::{NotificationOutboxEntry, ReservationConfirmation, NOTIFICATION_RESERVATION_CONFIRMED};
use hotelier_db::{Database, DbResult};

use crate::config::NotificationSettings;
use crate::notifier::Notifier;

/// Outcome of one delivery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Background worker that drains the notification outbox.
pub struct NotificationDispatcher {
    db: Database,
    notifier: Arc<dyn Notifier>,
    settings: NotificationSettings,
    wake_rx: mpsc::Receiver<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for waking or stopping a running dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    wake_tx: mpsc::Sender<()>,
    shutdown_tx: mpsc::Sender<()>,
}

impl DispatcherHandle {
    /// Requests an immediate delivery pass. Never blocks; a wake already
    /// queued covers this one.
    pub fn wake(&self) {
        let _ = self.wake_tx.try_send(());
    }

    /// Stops the dispatcher after its current pass.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Dispatcher already stopped");
        }
    }
}

impl NotificationDispatcher {
    /// Creates a new dispatcher and returns a handle.
    pub fn new(
        db: Database,
        notifier: Arc<dyn Notifier>,
        settings: NotificationSettings,
    ) -> (Self, DispatcherHandle) {
        let (wake_tx, wake_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let dispatcher = NotificationDispatcher {
            db,
            notifier,
            settings,
            wake_rx,
            shutdown_rx,
        };

        (dispatcher, DispatcherHandle { wake_tx, shutdown_tx })
    }

    /// Runs the dispatcher loop.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!("Notification dispatcher starting");

        let mut interval = tokio::time::interval(self.settings.poll_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => self.deliver_logged().await,

                Some(()) = self.wake_rx.recv() => self.deliver_logged().await,

                _ = self.shutdown_rx.recv() => {
                    info!("Notification dispatcher shutting down");
                    break;
                }
            }
        }

        info!("Notification dispatcher stopped");
    }

    async fn deliver_logged(&self) {
        if let Err(e) = self.deliver_pending().await {
            error!(error = %e, "Failed to process notification outbox");
        }
    }

    /// Runs one delivery pass over the pending entries.
    pub async fn deliver_pending(&self) -> DbResult<DeliveryReport> {
        let outbox = self.db.notifications();
        let entries = outbox
            .get_pending(self.settings.batch_size, self.settings.max_attempts)
            .await?;

        let mut report = DeliveryReport::default();

        if entries.is_empty() {
            debug!("No pending notifications");
        } else {
            debug!(count = entries.len(), "Delivering notifications");
        }

        for entry in &entries {
            match self.deliver(entry).await {
                Ok(()) => {
                    outbox.mark_delivered(&entry.id).await?;
                    report.delivered += 1;
                }
                Err(reason) => {
                    warn!(
                        id = %entry.id,
                        reservation_id = %entry.reservation_id,
                        attempts = entry.attempts + 1,
                        error = %reason,
                        "Notification delivery failed"
                    );
                    outbox.mark_failed(&entry.id, &reason).await?;
                    report.failed += 1;
                }
            }
        }

        let exhausted = outbox.count_exhausted(self.settings.max_attempts).await?;
        if exhausted > 0 {
            warn!(
                count = exhausted,
                max_attempts = self.settings.max_attempts,
                "Notifications exceeded max delivery attempts"
            );
        }

        if report.delivered > 0 || report.failed > 0 {
            info!(delivered = report.delivered, failed = report.failed, "Notification pass complete");
        }

        Ok(report)
    }

    async fn deliver(&self, entry: &NotificationOutboxEntry) -> Result<(), String> {
        if entry.kind != NOTIFICATION_RESERVATION_CONFIRMED {
            return Err(format!("unknown notification kind '{}'", entry.kind));
        }

        let confirmation: ReservationConfirmation = serde_json::from_str(&entry.payload)
            .map_err(|e| format!("malformed payload: {}", e))?;

        self.notifier
            .send_reservation_confirmation(&confirmation)
            .await
            .map_err(|e| e.to_string())
    }
}
