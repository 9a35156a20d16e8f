//! Outbox polling loop.
//!
//! Rows are leased with `FOR UPDATE SKIP LOCKED`, so several replicas can run
//! the worker at once. Failures are retried with exponential backoff until
//! [`MAX_OUTBOX_ATTEMPTS`], after which the row is dead-lettered.

#![allow(async_fn_in_trait)]

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::domain::repository::OutboxRepository;
use crate::domain::types::{ClaimedMessage, MAX_OUTBOX_ATTEMPTS, WorkItem};
use crate::error::TicketsServiceError;

/// Executes one decoded work item.
pub trait WorkHandler: Send + Sync {
    async fn handle(&self, item: WorkItem) -> Result<(), TicketsServiceError>;
}

const MAX_BACKOFF_SECS: i64 = 15 * 60;

/// Delay before retry number `attempts` (1-based): 2, 4, 8 ... seconds, capped at 15 minutes.
pub fn backoff(attempts: u32) -> chrono::Duration {
    let secs = 1_i64
        .checked_shl(attempts.min(30))
        .unwrap_or(MAX_BACKOFF_SECS)
        .min(MAX_BACKOFF_SECS);
    chrono::Duration::seconds(secs)
}

pub struct OutboxWorker<O: OutboxRepository, H: WorkHandler> {
    pub outbox: O,
    pub handler: H,
    pub batch_size: u64,
    pub poll_interval: std::time::Duration,
    /// How long a claimed row stays invisible to other workers.
    pub lease: chrono::Duration,
}

impl<O: OutboxRepository, H: WorkHandler> OutboxWorker<O, H> {
    /// Claim and process one batch. Returns how many rows were claimed.
    pub async fn run_once(&self) -> Result<usize, TicketsServiceError> {
        let now = Utc::now();
        let claimed = self
            .outbox
            .claim_due(now, self.batch_size, now + self.lease)
            .await?;
        let count = claimed.len();
        for message in claimed {
            self.process(message).await?;
        }
        Ok(count)
    }

    async fn process(&self, message: ClaimedMessage) -> Result<(), TicketsServiceError> {
        let item = match serde_json::from_value::<WorkItem>(message.payload) {
            Ok(item) => item,
            Err(e) => {
                error!(id = %message.id, kind = %message.kind, error = %e, "undecodable outbox payload");
                return self
                    .outbox
                    .mark_failed(message.id, &format!("undecodable payload: {e}"), None)
                    .await;
            }
        };

        match self.handler.handle(item).await {
            Ok(()) => {
                debug!(id = %message.id, kind = %message.kind, "outbox message processed");
                self.outbox.mark_processed(message.id).await
            }
            Err(e) => {
                let attempts = message.attempts + 1;
                let reason = match &e {
                    TicketsServiceError::Internal(inner) => format!("{inner:#}"),
                    other => other.to_string(),
                };
                let retry_at = if attempts >= MAX_OUTBOX_ATTEMPTS {
                    error!(id = %message.id, kind = %message.kind, attempts, error = %reason, "outbox message dead-lettered");
                    None
                } else {
                    warn!(id = %message.id, kind = %message.kind, attempts, error = %reason, "outbox message failed");
                    Some(Utc::now() + backoff(attempts))
                };
                self.outbox.mark_failed(message.id, &reason, retry_at).await
            }
        }
    }

    /// Poll forever. Sleeps only when a poll found nothing or failed.
    pub async fn run(self) {
        loop {
            match self.run_once().await {
                Ok(0) => tokio::time::sleep(self.poll_interval).await,
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "outbox poll failed");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
