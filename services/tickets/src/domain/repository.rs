#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ducktickets_domain::id::{AttendeeId, BatchId, EventId, OrderId};
use ducktickets_domain::order::OrderStatus;
use ducktickets_domain::pagination::PageRequest;

use crate::domain::types::{
    AttendeeListing, BuyerTicket, CachedResponse, CheckInTarget, CheckoutRequest, CheckoutSession, ClaimedMessage,
    ConfirmationEmail, Coupon, CreateOrderOutcome, Event, Order, OrderAggregate, OrderDraft, OutboxMessage, PaymentUpdate,
    ProviderPayment, ReconcileOutcome, TicketBatch,
};
use crate::error::TicketsServiceError;

/// Events, ticket batches and coupons.
pub trait CatalogRepository: Send + Sync {
    async fn create_event(&self, event: &Event) -> Result<(), TicketsServiceError>;

    /// Active events ordered by start date.
    async fn list_active_events(&self, page: PageRequest)
    -> Result<Vec<Event>, TicketsServiceError>;

    async fn find_event(&self, id: EventId) -> Result<Option<Event>, TicketsServiceError>;

    async fn create_batch(&self, batch: &TicketBatch) -> Result<(), TicketsServiceError>;

    /// Batches of an event ordered by sale start.
    async fn list_batches(&self, event_id: EventId)
    -> Result<Vec<TicketBatch>, TicketsServiceError>;

    /// Fails with `CouponAlreadyExists` when the code is taken.
    async fn create_coupon(&self, coupon: &Coupon) -> Result<(), TicketsServiceError>;

    /// Lookup by upper-cased code.
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, TicketsServiceError>;

    async fn find_batch(&self, id: BatchId) -> Result<Option<TicketBatch>, TicketsServiceError>;

    /// Store name, price, quantity and `is_active` of `batch`, unless the new
    /// quantity is below what was already sold. Returns whether it was stored.
    async fn update_batch(&self, batch: &TicketBatch) -> Result<bool, TicketsServiceError>;

    /// Delete a batch no order references, with its coupons. Returns `false`
    /// when orders reference it.
    async fn delete_batch(&self, id: BatchId) -> Result<bool, TicketsServiceError>;

    /// Delete an event without orders, with its batches and coupons. Returns
    /// `false` when it has orders.
    async fn delete_event(&self, id: EventId) -> Result<bool, TicketsServiceError>;

    /// `(total, active)` event counts.
    async fn count_events(&self) -> Result<(u64, u64), TicketsServiceError>;
}

/// Orders and their line items / attendee placeholders.
pub trait OrderRepository: Send + Sync {
    /// Persist a draft atomically: insert order, reserve inventory per item
    /// (`InsufficientInventory` when a batch or the event ceiling would be
    /// exceeded), redeem coupons (`InvalidCoupon` when exhausted), insert items
    /// and attendees.
    ///
    /// Keys held by orders created before `key_released_before` are freed first,
    /// so an expired idempotency window can be reused.
    async fn create_order(
        &self,
        draft: &OrderDraft,
        key_released_before: DateTime<Utc>,
    ) -> Result<CreateOrderOutcome, TicketsServiceError>;

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, TicketsServiceError>;

    async fn find_by_idempotency_key(&self, key: &str)
    -> Result<Option<Order>, TicketsServiceError>;

    async fn find_aggregate(&self, id: OrderId)
    -> Result<Option<OrderAggregate>, TicketsServiceError>;

    /// Conditional status change. Returns `false` if the order was not in `from`.
    async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, TicketsServiceError>;

    /// Expire every pending order created before `cutoff`. Returns the count.
    async fn expire_pending_before(&self, cutoff: DateTime<Utc>)
    -> Result<u64, TicketsServiceError>;

    /// Orders of an event, newest first.
    async fn list_for_event(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> Result<Vec<Order>, TicketsServiceError>;

    /// Orders placed with a normalized buyer email, newest first.
    async fn list_by_email(&self, email: &str) -> Result<Vec<Order>, TicketsServiceError>;

    /// `(total, paid)` order counts.
    async fn count_orders(&self) -> Result<(u64, u64), TicketsServiceError>;
}

/// Cached responses keyed by idempotency key.
pub trait IdempotencyStore: Send + Sync {
    /// Stored response if the key exists and has not expired at `now`.
    async fn find_fresh(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedResponse>, TicketsServiceError>;

    /// Insert or overwrite.
    async fn save(
        &self,
        key: &str,
        cached: &CachedResponse,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TicketsServiceError>;
}

pub trait PaymentRepository: Send + Sync {
    /// Apply a provider payment event in one transaction that locks the order
    /// row first. Terminal payments are never overwritten; the same event body
    /// (`event_hash`) is applied at most once. An approval of a pending order
    /// marks it paid and enqueues `issue_tickets` in the same transaction.
    async fn reconcile(
        &self,
        order_id: OrderId,
        update: &PaymentUpdate,
        event_hash: &str,
    ) -> Result<ReconcileOutcome, TicketsServiceError>;
}

pub trait AttendeeRepository: Send + Sync {
    /// Set tokens on attendees that have none. Returns how many were set.
    async fn assign_tokens(
        &self,
        tokens: &[(AttendeeId, String)],
    ) -> Result<u64, TicketsServiceError>;

    async fn find_check_in_target(
        &self,
        id: AttendeeId,
    ) -> Result<Option<CheckInTarget>, TicketsServiceError>;

    /// `checked_in = true` only if not yet checked in. Returns whether this call flipped it.
    async fn mark_checked_in(
        &self,
        id: AttendeeId,
        at: DateTime<Utc>,
    ) -> Result<bool, TicketsServiceError>;

    /// Attendees of the event's paid orders, oldest first.
    async fn list_paid_for_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<AttendeeListing>, TicketsServiceError>;

    /// Tickets of every order placed with a normalized buyer email.
    async fn list_tickets_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<BuyerTicket>, TicketsServiceError>;
}

pub trait OutboxRepository: Send + Sync {
    /// Insert unless a row with the same idempotency key exists. Returns whether inserted.
    async fn enqueue(&self, message: &OutboxMessage) -> Result<bool, TicketsServiceError>;

    /// Lease up to `limit` due rows until `lease_until`. Concurrent workers
    /// never receive the same row.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<ClaimedMessage>, TicketsServiceError>;

    async fn mark_processed(&self, id: Uuid) -> Result<(), TicketsServiceError>;

    /// Record a failed attempt. `retry_at = None` dead-letters the row.
    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> Result<(), TicketsServiceError>;
}

/// Port to an external payment provider.
pub trait PaymentProvider: Send + Sync {
    /// Stored on payment rows.
    fn name(&self) -> &'static str;

    async fn create_payment(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, TicketsServiceError>;

    /// Constant-time check of `signature` against the raw body.
    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool;

    async fn get_payment_status(
        &self,
        external_id: &str,
    ) -> Result<Option<ProviderPayment>, TicketsServiceError>;

    /// Resolve a webhook body to a payment update. `None` for notifications
    /// that are not about payments or reference unknown payments.
    async fn process_webhook(
        &self,
        payload: &serde_json::Value,
    ) -> Result<Option<PaymentUpdate>, TicketsServiceError> {
        use ducktickets_domain::payment::PaymentStatus;

        if payload.get("type").and_then(|t| t.as_str()) != Some("payment") {
            return Ok(None);
        }
        let Some(external_id) = payload
            .pointer("/data/id")
            .and_then(|id| match id {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        else {
            return Ok(None);
        };
        let Some(payment) = self.get_payment_status(&external_id).await? else {
            return Ok(None);
        };
        let Some(status) = PaymentStatus::from_provider(&payment.status) else {
            tracing::warn!(external_id = %external_id, status = %payment.status, "unknown provider payment status");
            return Ok(None);
        };
        Ok(Some(PaymentUpdate {
            external_id: payment.id,
            order_reference: payment.external_reference.unwrap_or_default(),
            status,
            amount: payment.amount.unwrap_or_default(),
            payment_method: payment.payment_method,
            raw: payment.raw,
        }))
    }
}

/// Outbound confirmation email.
pub trait Mailer: Send + Sync {
    async fn send_confirmation(&self, email: &ConfirmationEmail) -> Result<(), TicketsServiceError>;
}
