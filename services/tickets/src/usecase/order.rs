use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use ducktickets_domain::id::{AttendeeId, BatchId, EventId, OrderId, OrderItemId};
use ducktickets_domain::money::{apply_discount, line_total};
use ducktickets_domain::order::{InvalidTransition, OrderStatus};

use crate::domain::repository::{CatalogRepository, IdempotencyStore, OrderRepository};
use crate::domain::types::{
    Attendee, Buyer, CachedResponse, Coupon, CreateOrderOutcome, Event, Order, OrderAggregate, OrderDraft,
    OrderItem, OrderSummary, TicketBatch,
};
use crate::error::TicketsServiceError;
use crate::usecase::idempotency::{derive_key, scope_client_key};
use crate::usecase::validation::{
    normalize_coupon_code, validate_buyer, validate_idempotency_key, validate_lines,
};

#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub batch_id: BatchId,
    pub quantity: u32,
    pub coupon_code: Option<String>,
}

/// Price and assemble an order without touching storage.
///
/// Checks batch membership, sale window, visible availability, event ceiling
/// and coupon applicability. The authoritative inventory and coupon checks run
/// again atomically in [`OrderRepository::create_order`].
pub fn build_order_draft(
    event: &Event,
    batches: &[TicketBatch],
    coupons: &[Coupon],
    buyer: Buyer,
    lines: &[OrderLineInput],
    idempotency_key: Option<String>,
    now: DateTime<Utc>,
) -> Result<OrderDraft, TicketsServiceError> {
    let order_id = OrderId::new();
    let mut items = Vec::with_capacity(lines.len());
    let mut attendees = Vec::new();

    for line in lines {
        let batch = batches
            .iter()
            .find(|b| b.id == line.batch_id && b.event_id == event.id)
            .ok_or(TicketsServiceError::BatchNotFound)?;
        if !batch.is_on_sale(now) {
            return Err(TicketsServiceError::SaleWindowClosed);
        }
        if line.quantity > batch.available() {
            return Err(TicketsServiceError::InsufficientInventory);
        }

        let (unit_price, coupon_id) = match normalize_coupon_code(line.coupon_code.as_deref()) {
            None if batch.requires_coupon => return Err(TicketsServiceError::CouponRequired),
            None => (batch.price, None),
            Some(code) => {
                let coupon = coupons
                    .iter()
                    .find(|c| c.code == code)
                    .filter(|c| c.applies_to(batch.id, now))
                    .ok_or(TicketsServiceError::InvalidCoupon)?;
                let price =
                    apply_discount(batch.price, coupon.discount_percent, coupon.discount_amount);
                (price, Some(coupon.id))
            }
        };

        items.push(OrderItem {
            id: OrderItemId::new(),
            order_id,
            batch_id: batch.id,
            coupon_id,
            quantity: line.quantity,
            unit_price,
            total_price: line_total(unit_price, line.quantity),
        });
        attendees.extend((0..line.quantity).map(|_| Attendee {
            id: AttendeeId::new(),
            order_id,
            batch_id: batch.id,
            full_name: buyer.full_name.clone(),
            email: buyer.email.clone(),
            phone: buyer.phone.clone(),
            token: None,
            checked_in: false,
            checked_in_at: None,
        }));
    }

    if let Some(max) = event.max_attendees {
        let sold: u32 = batches
            .iter()
            .filter(|b| b.event_id == event.id)
            .map(|b| b.sold_quantity)
            .sum();
        let requested: u32 = items.iter().map(|i| i.quantity).sum();
        if sold + requested > max {
            return Err(TicketsServiceError::InsufficientInventory);
        }
    }

    let total_amount = items.iter().map(|i| i.total_price).sum();
    Ok(OrderDraft {
        order: Order {
            id: order_id,
            event_id: event.id,
            buyer,
            total_amount,
            status: OrderStatus::Pending,
            idempotency_key,
            request_hash: None,
            created_at: now,
            updated_at: now,
        },
        items,
        attendees,
        max_attendees: event.max_attendees,
    })
}

// ── CreateOrder ──────────────────────────────────────────────────────────────

pub struct CreateOrderInput {
    pub event_id: EventId,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub items: Vec<OrderLineInput>,
    /// `Idempotency-Key` header, if the client sent one. Scoped to the buyer
    /// email and event before use.
    pub idempotency_key: Option<String>,
}

pub struct CreateOrderUseCase<C, R, I>
where
    C: CatalogRepository,
    R: OrderRepository,
    I: IdempotencyStore,
{
    pub catalog: C,
    pub orders: R,
    pub idempotency: I,
    pub idempotency_ttl: Duration,
}

impl<C, R, I> CreateOrderUseCase<C, R, I>
where
    C: CatalogRepository,
    R: OrderRepository,
    I: IdempotencyStore,
{
    pub async fn execute(
        &self,
        input: CreateOrderInput,
    ) -> Result<OrderSummary, TicketsServiceError> {
        // 1. Validate before any storage access
        let buyer = validate_buyer(&input.email, &input.full_name, input.phone.as_deref())?;
        validate_lines(&input.items)?;
        let fingerprint = derive_key(&buyer, input.event_id, &input.items);
        let key = match input.idempotency_key.as_deref() {
            Some(raw) => {
                let client_key = validate_idempotency_key(raw)?;
                scope_client_key(&buyer.email, input.event_id, &client_key)
            }
            None => fingerprint.clone(),
        };

        // 2. Replay a fresh cached response, but only for the same body
        let now = Utc::now();
        if let Some(cached) = self.idempotency.find_fresh(&key, now).await? {
            if cached.request_hash != fingerprint {
                return Err(TicketsServiceError::IdempotencyKeyReused);
            }
            debug!(idempotency_key = %key, "replaying cached order response");
            let summary =
                serde_json::from_value(cached.response).context("decode cached order response")?;
            return Ok(summary);
        }

        // 3. Price against the current catalog
        let event = self
            .catalog
            .find_event(input.event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        if !event.is_active {
            return Err(TicketsServiceError::validation(
                "event is not accepting orders",
            ));
        }
        let batches = self.catalog.list_batches(event.id).await?;
        let mut coupons = Vec::new();
        for line in &input.items {
            if let Some(code) = normalize_coupon_code(line.coupon_code.as_deref()) {
                coupons.extend(self.catalog.find_coupon(&code).await?);
            }
        }
        let mut draft = build_order_draft(
            &event,
            &batches,
            &coupons,
            buyer,
            &input.items,
            Some(key.clone()),
            now,
        )?;
        draft.order.request_hash = Some(fingerprint.clone());

        // 4. Persist; a concurrent twin that won the key race answers for both
        let summary = match self
            .orders
            .create_order(&draft, now - self.idempotency_ttl)
            .await?
        {
            CreateOrderOutcome::Created => {
                info!(
                    order_id = %draft.order.id,
                    tickets = draft.ticket_count(),
                    total = %draft.order.total_amount,
                    "order created"
                );
                draft.summary()
            }
            CreateOrderOutcome::IdempotencyConflict => {
                let winner = self
                    .orders
                    .find_by_idempotency_key(&key)
                    .await?
                    .context("order holding idempotency key not found")?;
                if winner.request_hash.as_deref() != Some(fingerprint.as_str()) {
                    return Err(TicketsServiceError::IdempotencyKeyReused);
                }
                OrderSummary::from(&winner)
            }
        };

        // 5. Cache the response for replays
        let cached = CachedResponse {
            request_hash: fingerprint,
            response: serde_json::to_value(&summary).context("encode order response")?,
        };
        self.idempotency
            .save(&key, &cached, now + self.idempotency_ttl)
            .await?;
        Ok(summary)
    }
}

// ── GetOrder ─────────────────────────────────────────────────────────────────

pub struct GetOrderUseCase<R: OrderRepository> {
    pub orders: R,
}

impl<R: OrderRepository> GetOrderUseCase<R> {
    pub async fn execute(&self, id: OrderId) -> Result<OrderAggregate, TicketsServiceError> {
        self.orders
            .find_aggregate(id)
            .await?
            .ok_or(TicketsServiceError::OrderNotFound)
    }
}

// ── CancelOrder ──────────────────────────────────────────────────────────────

pub struct CancelOrderUseCase<R: OrderRepository> {
    pub orders: R,
}

impl<R: OrderRepository> CancelOrderUseCase<R> {
    pub async fn execute(&self, id: OrderId) -> Result<(), TicketsServiceError> {
        let order = self
            .orders
            .find_order(id)
            .await?
            .ok_or(TicketsServiceError::OrderNotFound)?;
        order.status.transition_to(OrderStatus::Cancelled)?;

        if !self
            .orders
            .transition(id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await?
        {
            // Lost a race with payment or expiry; report the status that won.
            let current = self
                .orders
                .find_order(id)
                .await?
                .ok_or(TicketsServiceError::OrderNotFound)?;
            return Err(InvalidTransition {
                from: current.status,
                to: OrderStatus::Cancelled,
            }
            .into());
        }
        info!(order_id = %id, "order cancelled");
        Ok(())
    }
}

// ── ExpireOrders ─────────────────────────────────────────────────────────────

pub struct ExpireOrdersUseCase<R: OrderRepository> {
    pub orders: R,
}

impl<R: OrderRepository> ExpireOrdersUseCase<R> {
    /// Expire pending orders older than `older_than`. Returns the count.
    pub async fn execute(&self, older_than: Duration) -> Result<u64, TicketsServiceError> {
        let cutoff = Utc::now() - older_than;
        let expired = self.orders.expire_pending_before(cutoff).await?;
        info!(expired, %cutoff, "expired stale pending orders");
        Ok(expired)
    }
}
