use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ducktickets_auth_types::identity::StaffIdentity;
use ducktickets_domain::id::{BatchId, CouponId, EventId};
use ducktickets_domain::pagination::PageRequest;
use ducktickets_domain::staff::StaffRole;

use super::require_role;
use crate::domain::types::{BatchChanges, Coupon, Event, TicketBatch};
use crate::error::TicketsServiceError;
use crate::state::AppState;
use crate::usecase::catalog::{
    CreateBatchInput, CreateBatchUseCase, CreateCouponInput, CreateCouponUseCase,
    CreateEventInput, CreateEventUseCase, DeleteBatchUseCase, DeleteEventUseCase,
    GetEventUseCase, ListEventsUseCase, UpdateBatchUseCase,
};

#[derive(Serialize)]
pub struct EventResponse {
    pub id: EventId,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    pub start_date: DateTime<Utc>,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    pub end_date: DateTime<Utc>,
    pub max_attendees: Option<u32>,
    pub is_active: bool,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            location: event.location,
            start_date: event.start_date,
            end_date: event.end_date,
            max_attendees: event.max_attendees,
            is_active: event.is_active,
        }
    }
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub id: BatchId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
    pub available: u32,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    pub sale_start: DateTime<Utc>,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    pub sale_end: DateTime<Utc>,
    pub requires_coupon: bool,
    pub on_sale: bool,
}

impl BatchResponse {
    fn new(batch: TicketBatch, now: DateTime<Utc>) -> Self {
        Self {
            id: batch.id,
            available: batch.available(),
            on_sale: batch.is_on_sale(now),
            name: batch.name,
            description: batch.description,
            price: batch.price,
            quantity: batch.quantity,
            sale_start: batch.sale_start,
            sale_end: batch.sale_end,
            requires_coupon: batch.requires_coupon,
        }
    }
}

// ── GET /events ──────────────────────────────────────────────────────────────

pub async fn list_events(
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<EventResponse>>, TicketsServiceError> {
    let usecase = ListEventsUseCase {
        catalog: state.catalog_repo(),
    };
    let events = usecase.execute(page).await?;
    Ok(Json(events.into_iter().map(EventResponse::from).collect()))
}

// ── POST /events ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_attendees: Option<u32>,
}

pub async fn create_event(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Json(body): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = CreateEventUseCase {
        catalog: state.catalog_repo(),
    };
    let event = usecase
        .execute(CreateEventInput {
            name: body.name,
            description: body.description,
            location: body.location,
            start_date: body.start_date,
            end_date: body.end_date,
            max_attendees: body.max_attendees,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

// ── GET /events/{event_id} ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventDetailsResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    pub batches: Vec<BatchResponse>,
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> Result<Json<EventDetailsResponse>, TicketsServiceError> {
    let usecase = GetEventUseCase {
        catalog: state.catalog_repo(),
    };
    let details = usecase.execute(event_id).await?;
    let now = Utc::now();
    Ok(Json(EventDetailsResponse {
        event: details.event.into(),
        batches: details
            .batches
            .into_iter()
            .map(|b| BatchResponse::new(b, now))
            .collect(),
    }))
}

// ── DELETE /events/{event_id} ────────────────────────────────────────────────

pub async fn delete_event(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path(event_id): Path<EventId>,
) -> Result<StatusCode, TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = DeleteEventUseCase {
        catalog: state.catalog_repo(),
    };
    usecase.execute(event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /events/{event_id}/batches ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateBatchRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: u32,
    pub sale_start: DateTime<Utc>,
    pub sale_end: DateTime<Utc>,
    #[serde(default)]
    pub requires_coupon: bool,
}

pub async fn create_batch(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path(event_id): Path<EventId>,
    Json(body): Json<CreateBatchRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = CreateBatchUseCase {
        catalog: state.catalog_repo(),
    };
    let batch = usecase
        .execute(
            event_id,
            CreateBatchInput {
                name: body.name,
                description: body.description,
                price: body.price,
                quantity: body.quantity,
                sale_start: body.sale_start,
                sale_end: body.sale_end,
                requires_coupon: body.requires_coupon,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(BatchResponse::new(batch, Utc::now()))))
}

// ── PATCH /events/{event_id}/batches/{batch_id} ──────────────────────────────

#[derive(Deserialize)]
pub struct UpdateBatchRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub is_active: Option<bool>,
}

pub async fn update_batch(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path((event_id, batch_id)): Path<(EventId, BatchId)>,
    Json(body): Json<UpdateBatchRequest>,
) -> Result<Json<BatchResponse>, TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = UpdateBatchUseCase {
        catalog: state.catalog_repo(),
    };
    let batch = usecase
        .execute(
            event_id,
            batch_id,
            BatchChanges {
                name: body.name,
                price: body.price,
                quantity: body.quantity,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(Json(BatchResponse::new(batch, Utc::now())))
}

// ── DELETE /events/{event_id}/batches/{batch_id} ─────────────────────────────

pub async fn delete_batch(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path((event_id, batch_id)): Path<(EventId, BatchId)>,
) -> Result<StatusCode, TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = DeleteBatchUseCase {
        catalog: state.catalog_repo(),
    };
    usecase.execute(event_id, batch_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /events/{event_id}/coupons ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCouponRequest {
    pub ticket_batch_id: BatchId,
    pub code: String,
    #[serde(default)]
    pub discount_percent: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    pub max_uses: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct CouponResponse {
    pub id: CouponId,
    pub code: String,
    pub ticket_batch_id: BatchId,
    pub discount_percent: Decimal,
    pub discount_amount: Decimal,
    pub max_uses: u32,
    pub used_count: u32,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms_opt")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Coupon> for CouponResponse {
    fn from(coupon: Coupon) -> Self {
        Self {
            id: coupon.id,
            code: coupon.code,
            ticket_batch_id: coupon.batch_id,
            discount_percent: coupon.discount_percent,
            discount_amount: coupon.discount_amount,
            max_uses: coupon.max_uses,
            used_count: coupon.used_count,
            expires_at: coupon.expires_at,
        }
    }
}

pub async fn create_coupon(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path(event_id): Path<EventId>,
    Json(body): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<CouponResponse>), TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = CreateCouponUseCase {
        catalog: state.catalog_repo(),
    };
    let coupon = usecase
        .execute(
            event_id,
            CreateCouponInput {
                batch_id: body.ticket_batch_id,
                code: body.code,
                discount_percent: body.discount_percent,
                discount_amount: body.discount_amount,
                max_uses: body.max_uses,
                expires_at: body.expires_at,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(coupon.into())))
}
