use anyhow::Context as _;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use ducktickets_domain::id::OrderId;
use ducktickets_domain::order::OrderStatus;

use crate::domain::repository::{
    CatalogRepository, OrderRepository, OutboxRepository, PaymentProvider, PaymentRepository,
};
use crate::domain::types::{
    CheckoutLine, CheckoutRequest, CheckoutSession, OutboxMessage, ReconcileOutcome, WorkItem,
};
use crate::error::TicketsServiceError;

/// What a webhook delivery did. Everything except a bad signature is
/// acknowledged to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied { order_id: OrderId, order_paid: bool },
    Duplicate,
    Ignored,
    OrderNotFound,
    /// Provider lookup failed; retried from the outbox.
    Queued,
}

impl WebhookOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Applied { .. } => "applied",
            Self::Duplicate => "duplicate",
            Self::Ignored => "ignored",
            Self::OrderNotFound => "order_not_found",
            Self::Queued => "queued",
        }
    }
}

/// SHA-256 hex of a raw webhook body.
pub fn event_hash(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

// ── ApplyWebhook ─────────────────────────────────────────────────────────────

pub struct ApplyWebhookUseCase<P, R, O>
where
    P: PaymentProvider,
    R: PaymentRepository,
    O: OutboxRepository,
{
    pub provider: P,
    pub payments: R,
    pub outbox: O,
}

impl<P, R, O> ApplyWebhookUseCase<P, R, O>
where
    P: PaymentProvider,
    R: PaymentRepository,
    O: OutboxRepository,
{
    /// Verify and apply a raw webhook delivery.
    pub async fn execute(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, TicketsServiceError> {
        let signature = signature.map(str::trim).unwrap_or_default();
        if signature.is_empty() || !self.provider.verify_webhook(body, signature) {
            return Err(TicketsServiceError::InvalidSignature);
        }

        let hash = event_hash(body);
        let Ok(payload) = serde_json::from_slice::<Value>(body) else {
            warn!(event_hash = %hash, "webhook body is not JSON");
            return Ok(WebhookOutcome::Ignored);
        };

        match self.apply_verified(&payload, &hash).await {
            Err(TicketsServiceError::PaymentProvider(reason)) => {
                warn!(event_hash = %hash, reason = %reason, "provider lookup failed, deferring webhook");
                let message = OutboxMessage::for_work(&WorkItem::PaymentWebhook {
                    data: payload,
                    event_hash: hash,
                })
                .context("encode deferred webhook")?;
                self.outbox.enqueue(&message).await?;
                Ok(WebhookOutcome::Queued)
            }
            other => other,
        }
    }

    /// Apply a webhook whose signature was already checked.
    pub async fn apply_verified(
        &self,
        payload: &Value,
        event_hash: &str,
    ) -> Result<WebhookOutcome, TicketsServiceError> {
        let Some(update) = self.provider.process_webhook(payload).await? else {
            return Ok(WebhookOutcome::Ignored);
        };
        let Ok(order_id) = update.order_reference.parse::<OrderId>() else {
            warn!(
                external_id = %update.external_id,
                reference = %update.order_reference,
                "payment references no order"
            );
            return Ok(WebhookOutcome::OrderNotFound);
        };

        let outcome = self.payments.reconcile(order_id, &update, event_hash).await?;
        Ok(match outcome {
            ReconcileOutcome::Applied {
                order_id,
                status,
                order_paid,
            } => {
                if status.is_failure() {
                    info!(
                        %order_id,
                        external_id = %update.external_id,
                        payment_status = %status,
                        "payment failed, order left pending"
                    );
                } else {
                    info!(
                        %order_id,
                        external_id = %update.external_id,
                        payment_status = %status,
                        order_paid,
                        "payment applied"
                    );
                }
                WebhookOutcome::Applied {
                    order_id,
                    order_paid,
                }
            }
            ReconcileOutcome::Duplicate => {
                info!(%order_id, external_id = %update.external_id, "duplicate payment event");
                WebhookOutcome::Duplicate
            }
            ReconcileOutcome::OrderNotFound => {
                warn!(%order_id, external_id = %update.external_id, "payment for unknown order");
                WebhookOutcome::OrderNotFound
            }
        })
    }
}

// ── StartCheckout ────────────────────────────────────────────────────────────

pub struct StartCheckoutUseCase<R, C, P>
where
    R: OrderRepository,
    C: CatalogRepository,
    P: PaymentProvider,
{
    pub orders: R,
    pub catalog: C,
    pub provider: P,
}

impl<R, C, P> StartCheckoutUseCase<R, C, P>
where
    R: OrderRepository,
    C: CatalogRepository,
    P: PaymentProvider,
{
    /// Open a provider checkout for a pending order.
    pub async fn execute(&self, order_id: OrderId) -> Result<CheckoutSession, TicketsServiceError> {
        let aggregate = self
            .orders
            .find_aggregate(order_id)
            .await?
            .ok_or(TicketsServiceError::OrderNotFound)?;
        aggregate.order.status.transition_to(OrderStatus::Paid)?;

        let event = self
            .catalog
            .find_event(aggregate.order.event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        let batches = self.catalog.list_batches(event.id).await?;

        let lines = aggregate
            .items
            .iter()
            .map(|item| {
                let batch_name = batches
                    .iter()
                    .find(|b| b.id == item.batch_id)
                    .map_or("Ticket", |b| b.name.as_str());
                CheckoutLine {
                    title: format!("{batch_name} - {}", event.name),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                }
            })
            .collect();

        let session = self
            .provider
            .create_payment(&CheckoutRequest {
                order_id,
                buyer: aggregate.order.buyer.clone(),
                lines,
            })
            .await?;
        info!(%order_id, preference_id = %session.preference_id, "checkout started");
        Ok(session)
    }
}
