use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ducktickets_domain::id::{AttendeeId, BatchId, CouponId, EventId, OrderId, OrderItemId};
use ducktickets_domain::order::OrderStatus;
use ducktickets_domain::payment::PaymentStatus;

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Ceiling on tickets sold across all batches. `None` = no ceiling.
    pub max_attendees: Option<u32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TicketBatch {
    pub id: BatchId,
    pub event_id: EventId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
    pub sold_quantity: u32,
    pub sale_start: DateTime<Utc>,
    pub sale_end: DateTime<Utc>,
    pub is_active: bool,
    pub requires_coupon: bool,
}

impl TicketBatch {
    pub fn available(&self) -> u32 {
        self.quantity.saturating_sub(self.sold_quantity)
    }

    /// Active and `now` within `[sale_start, sale_end]`.
    pub fn is_on_sale(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.sale_start <= now && now <= self.sale_end
    }
}

/// Admin edit of a batch. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct BatchChanges {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Coupon {
    pub id: CouponId,
    /// Stored upper-case.
    pub code: String,
    pub batch_id: BatchId,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub max_uses: u32,
    pub used_count: u32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Coupon {
    /// Whether the coupon can discount a line of `batch_id` at `now`.
    /// Use-count exhaustion is re-checked atomically at redemption.
    pub fn applies_to(&self, batch_id: BatchId, now: DateTime<Utc>) -> bool {
        self.batch_id == batch_id
            && self.is_active
            && self.used_count < self.max_uses
            && self.expires_at.is_none_or(|at| at > now)
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buyer {
    /// Lower-cased.
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub event_id: EventId,
    pub buyer: Buyer,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub idempotency_key: Option<String>,
    pub request_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub batch_id: BatchId,
    pub coupon_id: Option<CouponId>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct Attendee {
    pub id: AttendeeId,
    pub order_id: OrderId,
    pub batch_id: BatchId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub token: Option<String>,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Order with its line items and attendees, loaded by explicit queries.
#[derive(Debug, Clone)]
pub struct OrderAggregate {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub attendees: Vec<Attendee>,
}

/// Everything `create_order` persists in one transaction.
///
/// Each item's `quantity` is reserved against its batch and each
/// `coupon_id` redeemed once.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub attendees: Vec<Attendee>,
    /// Event capacity ceiling to enforce, if any.
    pub max_attendees: Option<u32>,
}

impl OrderDraft {
    pub fn ticket_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary::from(&self.order)
    }
}

/// Replayable order response and the fingerprint of the request that produced it.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub request_hash: String,
    pub response: serde_json::Value,
}

pub enum CreateOrderOutcome {
    Created,
    /// Another order already holds the idempotency key.
    IdempotencyConflict,
}

/// Response body of order creation, also the cached idempotent response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub total_amount: Decimal,
    pub status: OrderStatus,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            total_amount: order.total_amount,
            status: order.status,
        }
    }
}

// ── Reports ──────────────────────────────────────────────────────────────────

/// Attendee of a paid order, as listed and exported for an event.
#[derive(Debug, Clone)]
pub struct AttendeeListing {
    pub attendee: Attendee,
    pub batch_name: String,
    pub created_at: DateTime<Utc>,
}

/// One ticket as shown to the buyer who ordered it. Never carries the token.
#[derive(Debug, Clone)]
pub struct BuyerTicket {
    pub attendee_id: AttendeeId,
    pub attendee_name: String,
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub event_name: String,
    pub event_date: DateTime<Utc>,
    pub event_location: Option<String>,
    pub batch_name: String,
    pub price: Decimal,
    pub checked_in: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounters {
    pub total_events: u64,
    pub active_events: u64,
    pub total_orders: u64,
    pub paid_orders: u64,
}

// ── Payments ─────────────────────────────────────────────────────────────────

/// Provider payment state resolved from a webhook.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub external_id: String,
    /// `external_reference` as sent by the provider; expected to be an order id.
    pub order_reference: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub raw: serde_json::Value,
}

/// Result of applying one provider payment event inside the reconcile transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied {
        order_id: OrderId,
        status: PaymentStatus,
        /// The order moved `pending → paid` in this call.
        order_paid: bool,
    },
    Duplicate,
    OrderNotFound,
}

/// Payment-provider view of one payment.
#[derive(Debug, Clone)]
pub struct ProviderPayment {
    pub id: String,
    pub status: String,
    pub external_reference: Option<String>,
    pub amount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    pub buyer: Buyer,
    pub lines: Vec<CheckoutLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub preference_id: String,
    pub checkout_url: String,
}

// ── Check-in ─────────────────────────────────────────────────────────────────

/// Attendee plus the context needed to admit them.
#[derive(Debug, Clone)]
pub struct CheckInTarget {
    pub attendee: Attendee,
    pub order_status: OrderStatus,
    pub event_name: String,
    pub batch_name: String,
}

// ── Outbox ───────────────────────────────────────────────────────────────────

/// Work item carried by the outbox. Serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkItem {
    IssueTickets { order_id: OrderId },
    SendConfirmation { order_id: OrderId },
    /// Signature-verified webhook body whose provider lookup failed.
    PaymentWebhook { data: serde_json::Value, event_hash: String },
}

impl WorkItem {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IssueTickets { .. } => "issue_tickets",
            Self::SendConfirmation { .. } => "send_confirmation",
            Self::PaymentWebhook { .. } => "payment_webhook",
        }
    }

    /// At most one live outbox row per key.
    pub fn idempotency_key(&self) -> String {
        match self {
            Self::IssueTickets { order_id } => format!("issue_tickets:{order_id}"),
            Self::SendConfirmation { order_id } => format!("send_confirmation:{order_id}"),
            Self::PaymentWebhook { event_hash, .. } => format!("payment_webhook:{event_hash}"),
        }
    }
}

/// Outbox row to insert.
#[derive(Debug, Clone)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

impl OutboxMessage {
    pub fn for_work(item: &WorkItem) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::now_v7(),
            kind: item.kind().to_owned(),
            payload: serde_json::to_value(item)?,
            idempotency_key: item.idempotency_key(),
        })
    }
}

/// Outbox row leased to a worker.
#[derive(Debug, Clone)]
pub struct ClaimedMessage {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    /// Attempts before this one.
    pub attempts: u32,
}

/// Email sent to one attendee once tickets are issued.
#[derive(Debug, Clone)]
pub struct ConfirmationEmail {
    pub to: String,
    pub attendee_name: String,
    pub event_name: String,
    /// Signed ticket token.
    pub ticket_payload: String,
    /// `ticket_payload` as a QR code PNG.
    pub ticket_png: Vec<u8>,
    pub order_id: OrderId,
}

/// Deliveries before an outbox row is dead-lettered.
pub const MAX_OUTBOX_ATTEMPTS: u32 = 8;
