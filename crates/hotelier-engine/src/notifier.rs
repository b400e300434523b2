//! Guest notifications.
//!
//! The dispatcher hands each committed booking's confirmation to a
//! [`Notifier`]. Delivery failures are recorded on the outbox entry and
//! retried; they never affect the reservation.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use hotelier_core::ReservationConfirmation;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification relay returned status {0}")]
    Rejected(u16),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_reservation_confirmation(
        &self,
        confirmation: &ReservationConfirmation,
    ) -> Result<(), NotifyError>;
}

/// Writes confirmations to the log. Used when no relay is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_reservation_confirmation(
        &self,
        confirmation: &ReservationConfirmation,
    ) -> Result<(), NotifyError> {
        info!(
            reservation_id = %confirmation.reservation_id,
            email = %confirmation.email,
            room = %confirmation.room_number,
            check_in = %confirmation.check_in,
            check_out = %confirmation.check_out,
            "Reservation confirmation"
        );
        Ok(())
    }
}

/// POSTs the confirmation as JSON to a mail relay.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Config(format!("webhook client: {}", e)))?;

        Ok(WebhookNotifier {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_reservation_confirmation(
        &self,
        confirmation: &ReservationConfirmation,
    ) -> Result<(), NotifyError> {
        let response = self.client.post(&self.url).json(confirmation).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}
