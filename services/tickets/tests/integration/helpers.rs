use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use uuid::Uuid;

use ducktickets_domain::id::{AttendeeId, BatchId, EventId, OrderId};
use ducktickets_domain::order::OrderStatus;
use ducktickets_domain::pagination::PageRequest;
use ducktickets_domain::payment::PaymentStatus;
use ducktickets_tickets::domain::repository::{
    AttendeeRepository, CatalogRepository, IdempotencyStore, Mailer, OrderRepository,
    OutboxRepository, PaymentProvider, PaymentRepository,
};
use ducktickets_tickets::domain::types::{
    AttendeeListing, BuyerTicket, CachedResponse, CheckInTarget, CheckoutRequest, CheckoutSession, ClaimedMessage,
    ConfirmationEmail, Coupon, CreateOrderOutcome, Event, Order, OrderAggregate, OrderDraft, OutboxMessage, PaymentUpdate,
    ProviderPayment, ReconcileOutcome, TicketBatch, WorkItem,
};
use ducktickets_tickets::error::TicketsServiceError;
use ducktickets_tickets::infra::mercado_pago::sign_body;
use ducktickets_tickets::usecase::order::{CreateOrderInput, CreateOrderUseCase, OrderLineInput};
use ducktickets_tickets::usecase::payment::ApplyWebhookUseCase;
use ducktickets_tickets::usecase::ticket::TicketSigner;

pub const TICKET_SECRET: &str = "ticket-signing-secret";
pub const WEBHOOK_SECRET: &str = "webhook-secret";

// ── MemoryStore ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoredPayment {
    pub order_id: OrderId,
    pub status: PaymentStatus,
    pub last_event_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OutboxRow {
    pub id: Uuid,
    pub kind: String,
    pub payload: Value,
    pub idempotency_key: String,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub next_attempt_at: DateTime<Utc>,
    pub processed: bool,
    pub failed: bool,
}

#[derive(Default)]
pub struct StoreState {
    pub events: Vec<Event>,
    pub batches: Vec<TicketBatch>,
    pub coupons: Vec<Coupon>,
    pub orders: Vec<Order>,
    pub items: Vec<ducktickets_tickets::domain::types::OrderItem>,
    pub attendees: Vec<ducktickets_tickets::domain::types::Attendee>,
    pub payments: HashMap<String, StoredPayment>,
    pub idempotency: HashMap<String, (CachedResponse, DateTime<Utc>)>,
    pub outbox: Vec<OutboxRow>,
}

/// In-memory implementation of every repository. Each call takes the lock
/// once, so multi-step writes are atomic like their database counterparts.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn batch(&self, id: BatchId) -> TicketBatch {
        self.with(|s| s.batches.iter().find(|b| b.id == id).cloned().unwrap())
    }

    pub fn order(&self, id: OrderId) -> Order {
        self.with(|s| s.orders.iter().find(|o| o.id == id).cloned().unwrap())
    }

    pub fn order_count(&self) -> usize {
        self.with(|s| s.orders.len())
    }

    pub fn outbox_kinds(&self) -> Vec<String> {
        self.with(|s| s.outbox.iter().map(|r| r.kind.clone()).collect())
    }

    pub fn tokens_of(&self, order_id: OrderId) -> Vec<String> {
        self.with(|s| {
            s.attendees
                .iter()
                .filter(|a| a.order_id == order_id)
                .filter_map(|a| a.token.clone())
                .collect()
        })
    }
}

impl CatalogRepository for MemoryStore {
    async fn create_event(&self, event: &Event) -> Result<(), TicketsServiceError> {
        self.with(|s| s.events.push(event.clone()));
        Ok(())
    }

    async fn list_active_events(
        &self,
        page: PageRequest,
    ) -> Result<Vec<Event>, TicketsServiceError> {
        Ok(self.with(|s| {
            let mut events: Vec<Event> = s.events.iter().filter(|e| e.is_active).cloned().collect();
            events.sort_by_key(|e| e.start_date);
            events
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect()
        }))
    }

    async fn find_event(&self, id: EventId) -> Result<Option<Event>, TicketsServiceError> {
        Ok(self.with(|s| s.events.iter().find(|e| e.id == id).cloned()))
    }

    async fn create_batch(&self, batch: &TicketBatch) -> Result<(), TicketsServiceError> {
        self.with(|s| s.batches.push(batch.clone()));
        Ok(())
    }

    async fn list_batches(
        &self,
        event_id: EventId,
    ) -> Result<Vec<TicketBatch>, TicketsServiceError> {
        Ok(self.with(|s| {
            let mut batches: Vec<TicketBatch> = s
                .batches
                .iter()
                .filter(|b| b.event_id == event_id)
                .cloned()
                .collect();
            batches.sort_by_key(|b| b.sale_start);
            batches
        }))
    }

    async fn create_coupon(&self, coupon: &Coupon) -> Result<(), TicketsServiceError> {
        self.with(|s| {
            if s.coupons.iter().any(|c| c.code == coupon.code) {
                return Err(TicketsServiceError::CouponAlreadyExists);
            }
            s.coupons.push(coupon.clone());
            Ok(())
        })
    }

    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, TicketsServiceError> {
        Ok(self.with(|s| s.coupons.iter().find(|c| c.code == code).cloned()))
    }

    async fn find_batch(&self, id: BatchId) -> Result<Option<TicketBatch>, TicketsServiceError> {
        Ok(self.with(|s| s.batches.iter().find(|b| b.id == id).cloned()))
    }

    async fn update_batch(&self, batch: &TicketBatch) -> Result<bool, TicketsServiceError> {
        Ok(self.with(|s| {
            match s
                .batches
                .iter_mut()
                .find(|b| b.id == batch.id && b.sold_quantity <= batch.quantity)
            {
                Some(stored) => {
                    stored.name = batch.name.clone();
                    stored.price = batch.price;
                    stored.quantity = batch.quantity;
                    stored.is_active = batch.is_active;
                    true
                }
                None => false,
            }
        }))
    }

    async fn delete_batch(&self, id: BatchId) -> Result<bool, TicketsServiceError> {
        Ok(self.with(|s| {
            if s.items.iter().any(|i| i.batch_id == id) {
                return false;
            }
            s.batches.retain(|b| b.id != id);
            s.coupons.retain(|c| c.batch_id != id);
            true
        }))
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, TicketsServiceError> {
        Ok(self.with(|s| {
            if s.orders.iter().any(|o| o.event_id == id) {
                return false;
            }
            let batch_ids: Vec<BatchId> = s
                .batches
                .iter()
                .filter(|b| b.event_id == id)
                .map(|b| b.id)
                .collect();
            s.coupons.retain(|c| !batch_ids.contains(&c.batch_id));
            s.batches.retain(|b| b.event_id != id);
            s.events.retain(|e| e.id != id);
            true
        }))
    }

    async fn count_events(&self) -> Result<(u64, u64), TicketsServiceError> {
        Ok(self.with(|s| {
            let active = s.events.iter().filter(|e| e.is_active).count();
            (s.events.len() as u64, active as u64)
        }))
    }
}

impl OrderRepository for MemoryStore {
    async fn create_order(
        &self,
        draft: &OrderDraft,
        key_released_before: DateTime<Utc>,
    ) -> Result<CreateOrderOutcome, TicketsServiceError> {
        self.with(|s| {
            if let Some(key) = &draft.order.idempotency_key {
                for order in s.orders.iter_mut() {
                    if order.idempotency_key.as_ref() == Some(key)
                        && order.created_at < key_released_before
                    {
                        order.idempotency_key = None;
                    }
                }
                if s.orders
                    .iter()
                    .any(|o| o.idempotency_key.as_ref() == Some(key))
                {
                    return Ok(CreateOrderOutcome::IdempotencyConflict);
                }
            }

            if let Some(max) = draft.max_attendees {
                let sold: u32 = s
                    .batches
                    .iter()
                    .filter(|b| b.event_id == draft.order.event_id)
                    .map(|b| b.sold_quantity)
                    .sum();
                if sold + draft.ticket_count() > max {
                    return Err(TicketsServiceError::InsufficientInventory);
                }
            }
            for item in &draft.items {
                let batch = s
                    .batches
                    .iter()
                    .find(|b| b.id == item.batch_id)
                    .ok_or(TicketsServiceError::BatchNotFound)?;
                if batch.sold_quantity + item.quantity > batch.quantity {
                    return Err(TicketsServiceError::InsufficientInventory);
                }
                if let Some(coupon_id) = item.coupon_id {
                    let coupon = s
                        .coupons
                        .iter()
                        .find(|c| c.id == coupon_id)
                        .ok_or(TicketsServiceError::InvalidCoupon)?;
                    if !coupon.is_active || coupon.used_count >= coupon.max_uses {
                        return Err(TicketsServiceError::InvalidCoupon);
                    }
                }
            }

            for item in &draft.items {
                if let Some(batch) = s.batches.iter_mut().find(|b| b.id == item.batch_id) {
                    batch.sold_quantity += item.quantity;
                }
                if let Some(coupon) = s.coupons.iter_mut().find(|c| Some(c.id) == item.coupon_id) {
                    coupon.used_count += 1;
                }
            }
            s.orders.push(draft.order.clone());
            s.items.extend(draft.items.iter().cloned());
            s.attendees.extend(draft.attendees.iter().cloned());
            Ok(CreateOrderOutcome::Created)
        })
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, TicketsServiceError> {
        Ok(self.with(|s| s.orders.iter().find(|o| o.id == id).cloned()))
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Order>, TicketsServiceError> {
        Ok(self.with(|s| {
            s.orders
                .iter()
                .find(|o| o.idempotency_key.as_deref() == Some(key))
                .cloned()
        }))
    }

    async fn find_aggregate(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderAggregate>, TicketsServiceError> {
        Ok(self.with(|s| {
            let order = s.orders.iter().find(|o| o.id == id).cloned()?;
            Some(OrderAggregate {
                order,
                items: s.items.iter().filter(|i| i.order_id == id).cloned().collect(),
                attendees: s
                    .attendees
                    .iter()
                    .filter(|a| a.order_id == id)
                    .cloned()
                    .collect(),
            })
        }))
    }

    async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, TicketsServiceError> {
        Ok(self.with(|s| {
            match s.orders.iter_mut().find(|o| o.id == id && o.status == from) {
                Some(order) => {
                    order.status = to;
                    order.updated_at = Utc::now();
                    true
                }
                None => false,
            }
        }))
    }

    async fn expire_pending_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, TicketsServiceError> {
        Ok(self.with(|s| {
            let mut expired = 0;
            for order in s.orders.iter_mut() {
                if order.status == OrderStatus::Pending && order.created_at < cutoff {
                    order.status = OrderStatus::Expired;
                    expired += 1;
                }
            }
            expired
        }))
    }

    async fn list_for_event(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> Result<Vec<Order>, TicketsServiceError> {
        Ok(self.with(|s| {
            let mut orders: Vec<Order> = s
                .orders
                .iter()
                .filter(|o| o.event_id == event_id)
                .cloned()
                .collect();
            orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
            orders
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect()
        }))
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<Order>, TicketsServiceError> {
        Ok(self.with(|s| {
            let mut orders: Vec<Order> = s
                .orders
                .iter()
                .filter(|o| o.buyer.email == email)
                .cloned()
                .collect();
            orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
            orders
        }))
    }

    async fn count_orders(&self) -> Result<(u64, u64), TicketsServiceError> {
        Ok(self.with(|s| {
            let paid = s
                .orders
                .iter()
                .filter(|o| o.status == OrderStatus::Paid)
                .count();
            (s.orders.len() as u64, paid as u64)
        }))
    }
}

impl IdempotencyStore for MemoryStore {
    async fn find_fresh(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedResponse>, TicketsServiceError> {
        Ok(self.with(|s| {
            s.idempotency
                .get(key)
                .filter(|(_, expires_at)| *expires_at > now)
                .map(|(cached, _)| cached.clone())
        }))
    }

    async fn save(
        &self,
        key: &str,
        cached: &CachedResponse,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TicketsServiceError> {
        self.with(|s| {
            s.idempotency
                .insert(key.to_owned(), (cached.clone(), expires_at))
        });
        Ok(())
    }
}

fn push_outbox(s: &mut StoreState, message: &OutboxMessage) -> bool {
    if s.outbox
        .iter()
        .any(|r| r.idempotency_key == message.idempotency_key)
    {
        return false;
    }
    s.outbox.push(OutboxRow {
        id: message.id,
        kind: message.kind.clone(),
        payload: message.payload.clone(),
        idempotency_key: message.idempotency_key.clone(),
        attempts: 0,
        last_error: None,
        next_attempt_at: Utc::now(),
        processed: false,
        failed: false,
    });
    true
}

impl PaymentRepository for MemoryStore {
    async fn reconcile(
        &self,
        order_id: OrderId,
        update: &PaymentUpdate,
        event_hash: &str,
    ) -> Result<ReconcileOutcome, TicketsServiceError> {
        Ok(self.with(|s| {
            let Some(order_status) = s.orders.iter().find(|o| o.id == order_id).map(|o| o.status)
            else {
                return ReconcileOutcome::OrderNotFound;
            };
            let duplicate = s.payments.get(&update.external_id).is_some_and(|stored| {
                stored.last_event_hash.as_deref() == Some(event_hash)
                    || !stored.status.accepts(update.status)
            });
            if duplicate {
                return ReconcileOutcome::Duplicate;
            }
            s.payments.insert(
                update.external_id.clone(),
                StoredPayment {
                    order_id,
                    status: update.status,
                    last_event_hash: Some(event_hash.to_owned()),
                },
            );

            let mut order_paid = false;
            if update.status == PaymentStatus::Approved && order_status == OrderStatus::Pending {
                if let Some(order) = s.orders.iter_mut().find(|o| o.id == order_id) {
                    order.status = OrderStatus::Paid;
                }
                order_paid = true;
                push_outbox(
                    s,
                    &OutboxMessage::for_work(&WorkItem::IssueTickets { order_id }).unwrap(),
                );
            }
            ReconcileOutcome::Applied {
                order_id,
                status: update.status,
                order_paid,
            }
        }))
    }
}

impl AttendeeRepository for MemoryStore {
    async fn assign_tokens(
        &self,
        tokens: &[(AttendeeId, String)],
    ) -> Result<u64, TicketsServiceError> {
        Ok(self.with(|s| {
            let mut assigned = 0;
            for (id, token) in tokens {
                if let Some(a) = s
                    .attendees
                    .iter_mut()
                    .find(|a| a.id == *id && a.token.is_none())
                {
                    a.token = Some(token.clone());
                    assigned += 1;
                }
            }
            assigned
        }))
    }

    async fn find_check_in_target(
        &self,
        id: AttendeeId,
    ) -> Result<Option<CheckInTarget>, TicketsServiceError> {
        Ok(self.with(|s| {
            let attendee = s.attendees.iter().find(|a| a.id == id).cloned()?;
            let order = s.orders.iter().find(|o| o.id == attendee.order_id)?;
            let batch = s.batches.iter().find(|b| b.id == attendee.batch_id)?;
            let event = s.events.iter().find(|e| e.id == order.event_id)?;
            Some(CheckInTarget {
                order_status: order.status,
                event_name: event.name.clone(),
                batch_name: batch.name.clone(),
                attendee,
            })
        }))
    }

    async fn mark_checked_in(
        &self,
        id: AttendeeId,
        at: DateTime<Utc>,
    ) -> Result<bool, TicketsServiceError> {
        Ok(self.with(|s| {
            match s
                .attendees
                .iter_mut()
                .find(|a| a.id == id && !a.checked_in)
            {
                Some(a) => {
                    a.checked_in = true;
                    a.checked_in_at = Some(at);
                    true
                }
                None => false,
            }
        }))
    }

    async fn list_paid_for_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<AttendeeListing>, TicketsServiceError> {
        Ok(self.with(|s| {
            s.attendees
                .iter()
                .filter_map(|a| {
                    let order = s.orders.iter().find(|o| o.id == a.order_id)?;
                    if order.event_id != event_id || order.status != OrderStatus::Paid {
                        return None;
                    }
                    let batch = s.batches.iter().find(|b| b.id == a.batch_id)?;
                    Some(AttendeeListing {
                        attendee: a.clone(),
                        batch_name: batch.name.clone(),
                        created_at: order.created_at,
                    })
                })
                .collect()
        }))
    }

    async fn list_tickets_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<BuyerTicket>, TicketsServiceError> {
        Ok(self.with(|s| {
            s.attendees
                .iter()
                .filter_map(|a| {
                    let order = s
                        .orders
                        .iter()
                        .find(|o| o.id == a.order_id && o.buyer.email == email)?;
                    let event = s.events.iter().find(|e| e.id == order.event_id)?;
                    let batch = s.batches.iter().find(|b| b.id == a.batch_id)?;
                    let item = s
                        .items
                        .iter()
                        .find(|i| i.order_id == order.id && i.batch_id == a.batch_id)?;
                    Some(BuyerTicket {
                        attendee_id: a.id,
                        attendee_name: a.full_name.clone(),
                        order_id: order.id,
                        order_status: order.status,
                        event_name: event.name.clone(),
                        event_date: event.start_date,
                        event_location: event.location.clone(),
                        batch_name: batch.name.clone(),
                        price: item.unit_price,
                        checked_in: a.checked_in,
                    })
                })
                .collect()
        }))
    }
}

impl OutboxRepository for MemoryStore {
    async fn enqueue(&self, message: &OutboxMessage) -> Result<bool, TicketsServiceError> {
        Ok(self.with(|s| push_outbox(s, message)))
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<ClaimedMessage>, TicketsServiceError> {
        Ok(self.with(|s| {
            s.outbox
                .iter_mut()
                .filter(|r| !r.processed && !r.failed && r.next_attempt_at <= now)
                .take(limit as usize)
                .map(|r| {
                    r.next_attempt_at = lease_until;
                    ClaimedMessage {
                        id: r.id,
                        kind: r.kind.clone(),
                        payload: r.payload.clone(),
                        attempts: r.attempts,
                    }
                })
                .collect()
        }))
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), TicketsServiceError> {
        self.with(|s| {
            if let Some(r) = s.outbox.iter_mut().find(|r| r.id == id) {
                r.processed = true;
            }
        });
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> Result<(), TicketsServiceError> {
        self.with(|s| {
            if let Some(r) = s.outbox.iter_mut().find(|r| r.id == id) {
                r.attempts += 1;
                r.last_error = Some(error.to_owned());
                match retry_at {
                    Some(at) => r.next_attempt_at = at,
                    None => r.failed = true,
                }
            }
        });
        Ok(())
    }
}

// ── MockProvider ─────────────────────────────────────────────────────────────

/// Payment provider whose payments are set up by the test.
#[derive(Clone)]
pub struct MockProvider {
    pub payments: Arc<Mutex<HashMap<String, ProviderPayment>>>,
    pub unavailable: Arc<AtomicBool>,
    pub checkouts: Arc<Mutex<Vec<CheckoutRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            payments: Arc::default(),
            unavailable: Arc::new(AtomicBool::new(false)),
            checkouts: Arc::default(),
        }
    }

    /// Register a provider-side payment for `order_id`.
    pub fn set_payment(&self, external_id: &str, order_id: OrderId, status: &str, amount: Decimal) {
        self.payments.lock().unwrap().insert(
            external_id.to_owned(),
            ProviderPayment {
                id: external_id.to_owned(),
                status: status.to_owned(),
                external_reference: Some(order_id.to_string()),
                amount: Some(amount),
                payment_method: Some("pix".to_owned()),
                raw: json!({ "id": external_id, "status": status }),
            },
        );
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl PaymentProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_payment(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, TicketsServiceError> {
        self.checkouts.lock().unwrap().push(request.clone());
        Ok(CheckoutSession {
            preference_id: format!("pref-{}", request.order_id),
            checkout_url: format!("https://pay.example/{}", request.order_id),
        })
    }

    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        sign_body(WEBHOOK_SECRET, body) == signature
    }

    async fn get_payment_status(
        &self,
        external_id: &str,
    ) -> Result<Option<ProviderPayment>, TicketsServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TicketsServiceError::PaymentProvider(
                "provider unavailable".to_owned(),
            ));
        }
        Ok(self.payments.lock().unwrap().get(external_id).cloned())
    }
}

// ── MockMailer ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<ConfirmationEmail>>>,
}

impl Mailer for MockMailer {
    async fn send_confirmation(&self, email: &ConfirmationEmail) -> Result<(), TicketsServiceError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn signer() -> TicketSigner {
    TicketSigner::new(TICKET_SECRET)
}

/// Seed an active event with one on-sale batch.
pub fn seed_event(
    store: &MemoryStore,
    price: Decimal,
    quantity: u32,
    max_attendees: Option<u32>,
) -> (Event, TicketBatch) {
    let now = Utc::now();
    let event = Event {
        id: EventId::new(),
        name: "DuckConf".to_owned(),
        description: None,
        location: Some("São Paulo".to_owned()),
        start_date: now + Duration::days(30),
        end_date: now + Duration::days(31),
        max_attendees,
        is_active: true,
        created_at: now,
    };
    let batch = TicketBatch {
        id: BatchId::new(),
        event_id: event.id,
        name: "Early Bird".to_owned(),
        description: None,
        price,
        quantity,
        sold_quantity: 0,
        sale_start: now - Duration::days(1),
        sale_end: now + Duration::days(7),
        is_active: true,
        requires_coupon: false,
    };
    store.with(|s| {
        s.events.push(event.clone());
        s.batches.push(batch.clone());
    });
    (event, batch)
}

pub fn order_input(
    event_id: EventId,
    batch_id: BatchId,
    quantity: u32,
    email: &str,
    idempotency_key: Option<&str>,
) -> CreateOrderInput {
    CreateOrderInput {
        event_id,
        email: email.to_owned(),
        full_name: "Ana Souza".to_owned(),
        phone: None,
        items: vec![OrderLineInput {
            batch_id,
            quantity,
            coupon_code: None,
        }],
        idempotency_key: idempotency_key.map(str::to_owned),
    }
}

pub fn create_order_uc(
    store: &MemoryStore,
) -> CreateOrderUseCase<MemoryStore, MemoryStore, MemoryStore> {
    CreateOrderUseCase {
        catalog: store.clone(),
        orders: store.clone(),
        idempotency: store.clone(),
        idempotency_ttl: Duration::hours(24),
    }
}

pub fn webhook_uc(
    store: &MemoryStore,
    provider: &MockProvider,
) -> ApplyWebhookUseCase<MockProvider, MemoryStore, MemoryStore> {
    ApplyWebhookUseCase {
        provider: provider.clone(),
        payments: store.clone(),
        outbox: store.clone(),
    }
}

/// A `payment` notification body and its valid signature.
pub fn signed_webhook(external_id: &str, action: &str) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(&json!({
        "type": "payment",
        "action": action,
        "data": { "id": external_id },
    }))
    .unwrap();
    let signature = sign_body(WEBHOOK_SECRET, &body);
    (body, signature)
}
