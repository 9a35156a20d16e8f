use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use ducktickets_domain::id::{BatchId, CouponId, EventId};
use ducktickets_domain::money::{MAX_UNIT_PRICE, is_valid_price};
use ducktickets_domain::pagination::PageRequest;

use crate::domain::repository::CatalogRepository;
use crate::domain::types::{BatchChanges, Coupon, Event, TicketBatch};
use crate::error::TicketsServiceError;
use crate::usecase::validation::normalize_coupon_code;

fn require_name(raw: &str, max: usize) -> Result<String, TicketsServiceError> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > max {
        return Err(TicketsServiceError::validation(format!(
            "name must be between 1 and {max} characters"
        )));
    }
    Ok(name.to_owned())
}

fn require_price(price: Decimal) -> Result<(), TicketsServiceError> {
    if is_valid_price(price) {
        Ok(())
    } else {
        Err(TicketsServiceError::validation(format!(
            "price must be between 0 and {MAX_UNIT_PRICE} with at most 2 decimals"
        )))
    }
}

// ── CreateEvent ──────────────────────────────────────────────────────────────

pub struct CreateEventInput {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_attendees: Option<u32>,
}

pub struct CreateEventUseCase<C: CatalogRepository> {
    pub catalog: C,
}

impl<C: CatalogRepository> CreateEventUseCase<C> {
    pub async fn execute(&self, input: CreateEventInput) -> Result<Event, TicketsServiceError> {
        let name = require_name(&input.name, 200)?;
        if input.end_date <= input.start_date {
            return Err(TicketsServiceError::validation(
                "end_date must be after start_date",
            ));
        }
        if input.max_attendees == Some(0) {
            return Err(TicketsServiceError::validation(
                "max_attendees must be positive",
            ));
        }
        let event = Event {
            id: EventId::new(),
            name,
            description: input.description,
            location: input.location,
            start_date: input.start_date,
            end_date: input.end_date,
            max_attendees: input.max_attendees,
            is_active: true,
            created_at: Utc::now(),
        };
        self.catalog.create_event(&event).await?;
        info!(event_id = %event.id, "event created");
        Ok(event)
    }
}

// ── ListEvents / GetEvent ────────────────────────────────────────────────────

pub struct ListEventsUseCase<C: CatalogRepository> {
    pub catalog: C,
}

impl<C: CatalogRepository> ListEventsUseCase<C> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<Event>, TicketsServiceError> {
        self.catalog.list_active_events(page.clamped()).await
    }
}

pub struct EventDetails {
    pub event: Event,
    pub batches: Vec<TicketBatch>,
}

pub struct GetEventUseCase<C: CatalogRepository> {
    pub catalog: C,
}

impl<C: CatalogRepository> GetEventUseCase<C> {
    pub async fn execute(&self, id: EventId) -> Result<EventDetails, TicketsServiceError> {
        let event = self
            .catalog
            .find_event(id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        let batches = self.catalog.list_batches(id).await?;
        Ok(EventDetails { event, batches })
    }
}

// ── CreateBatch ──────────────────────────────────────────────────────────────

pub struct CreateBatchInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
    pub sale_start: DateTime<Utc>,
    pub sale_end: DateTime<Utc>,
    pub requires_coupon: bool,
}

pub struct CreateBatchUseCase<C: CatalogRepository> {
    pub catalog: C,
}

impl<C: CatalogRepository> CreateBatchUseCase<C> {
    pub async fn execute(
        &self,
        event_id: EventId,
        input: CreateBatchInput,
    ) -> Result<TicketBatch, TicketsServiceError> {
        let name = require_name(&input.name, 100)?;
        require_price(input.price)?;
        if input.quantity == 0 || input.quantity > i32::MAX as u32 {
            return Err(TicketsServiceError::validation("quantity must be positive"));
        }
        if input.sale_end <= input.sale_start {
            return Err(TicketsServiceError::validation(
                "sale_end must be after sale_start",
            ));
        }
        self.catalog
            .find_event(event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;

        let batch = TicketBatch {
            id: BatchId::new(),
            event_id,
            name,
            description: input.description,
            price: input.price.round_dp(2),
            quantity: input.quantity,
            sold_quantity: 0,
            sale_start: input.sale_start,
            sale_end: input.sale_end,
            is_active: true,
            requires_coupon: input.requires_coupon,
        };
        self.catalog.create_batch(&batch).await?;
        info!(%event_id, batch_id = %batch.id, quantity = batch.quantity, "ticket batch created");
        Ok(batch)
    }
}

// ── UpdateBatch ──────────────────────────────────────────────────────────────

pub struct UpdateBatchUseCase<C: CatalogRepository> {
    pub catalog: C,
}

impl<C: CatalogRepository> UpdateBatchUseCase<C> {
    pub async fn execute(
        &self,
        event_id: EventId,
        batch_id: BatchId,
        changes: BatchChanges,
    ) -> Result<TicketBatch, TicketsServiceError> {
        let mut batch = self
            .catalog
            .find_batch(batch_id)
            .await?
            .filter(|b| b.event_id == event_id)
            .ok_or(TicketsServiceError::BatchNotFound)?;

        if let Some(name) = changes.name {
            batch.name = require_name(&name, 100)?;
        }
        if let Some(price) = changes.price {
            require_price(price)?;
            batch.price = price.round_dp(2);
        }
        if let Some(quantity) = changes.quantity {
            if quantity == 0 || quantity > i32::MAX as u32 {
                return Err(TicketsServiceError::validation("quantity must be positive"));
            }
            batch.quantity = quantity;
        }
        if let Some(is_active) = changes.is_active {
            batch.is_active = is_active;
        }

        if batch.quantity < batch.sold_quantity || !self.catalog.update_batch(&batch).await? {
            return Err(TicketsServiceError::validation(
                "quantity must not be below tickets already sold",
            ));
        }
        info!(%event_id, %batch_id, quantity = batch.quantity, "ticket batch updated");
        Ok(batch)
    }
}

// ── DeleteBatch / DeleteEvent ────────────────────────────────────────────────

pub struct DeleteBatchUseCase<C: CatalogRepository> {
    pub catalog: C,
}

impl<C: CatalogRepository> DeleteBatchUseCase<C> {
    pub async fn execute(
        &self,
        event_id: EventId,
        batch_id: BatchId,
    ) -> Result<(), TicketsServiceError> {
        self.catalog
            .find_batch(batch_id)
            .await?
            .filter(|b| b.event_id == event_id)
            .ok_or(TicketsServiceError::BatchNotFound)?;
        if !self.catalog.delete_batch(batch_id).await? {
            return Err(TicketsServiceError::BatchHasOrders);
        }
        info!(%event_id, %batch_id, "ticket batch deleted");
        Ok(())
    }
}

pub struct DeleteEventUseCase<C: CatalogRepository> {
    pub catalog: C,
}

impl<C: CatalogRepository> DeleteEventUseCase<C> {
    /// Only events nobody has ordered from can be deleted.
    pub async fn execute(&self, event_id: EventId) -> Result<(), TicketsServiceError> {
        self.catalog
            .find_event(event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        if !self.catalog.delete_event(event_id).await? {
            return Err(TicketsServiceError::EventHasOrders);
        }
        info!(%event_id, "event deleted");
        Ok(())
    }
}

// ── CreateCoupon ─────────────────────────────────────────────────────────────

pub struct CreateCouponInput {
    pub batch_id: BatchId,
    pub code: String,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub max_uses: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct CreateCouponUseCase<C: CatalogRepository> {
    pub catalog: C,
}

impl<C: CatalogRepository> CreateCouponUseCase<C> {
    pub async fn execute(
        &self,
        event_id: EventId,
        input: CreateCouponInput,
    ) -> Result<Coupon, TicketsServiceError> {
        let code = normalize_coupon_code(Some(&input.code))
            .filter(|c| {
                (3..=50).contains(&c.len())
                    && c.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
            })
            .ok_or_else(|| TicketsServiceError::validation("invalid coupon code"))?;
        if input.discount_percent < Decimal::ZERO || input.discount_percent > Decimal::ONE_HUNDRED
        {
            return Err(TicketsServiceError::validation(
                "discount_percent must be between 0 and 100",
            ));
        }
        if !is_valid_price(input.discount_amount) {
            return Err(TicketsServiceError::validation(
                "discount_amount must be a non-negative amount with at most 2 decimals",
            ));
        }
        if input.max_uses == 0 || input.max_uses > i32::MAX as u32 {
            return Err(TicketsServiceError::validation("max_uses must be positive"));
        }

        let batches = self.catalog.list_batches(event_id).await?;
        if !batches.iter().any(|b| b.id == input.batch_id) {
            return Err(TicketsServiceError::BatchNotFound);
        }

        let coupon = Coupon {
            id: CouponId::new(),
            code,
            batch_id: input.batch_id,
            discount_percent: input.discount_percent,
            discount_amount: input.discount_amount.round_dp(2),
            max_uses: input.max_uses,
            used_count: 0,
            is_active: true,
            expires_at: input.expires_at,
        };
        self.catalog.create_coupon(&coupon).await?;
        info!(coupon_id = %coupon.id, batch_id = %coupon.batch_id, "coupon created");
        Ok(coupon)
    }
}
