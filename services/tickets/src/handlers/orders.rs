use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ducktickets_auth_types::identity::StaffIdentity;
use ducktickets_domain::id::{AttendeeId, BatchId, CouponId, EventId, OrderId};
use ducktickets_domain::order::OrderStatus;
use ducktickets_domain::staff::StaffRole;

use super::require_role;
use crate::domain::types::{CheckoutSession, Order, OrderAggregate, OrderSummary};
use crate::error::TicketsServiceError;
use crate::state::AppState;
use crate::usecase::order::{
    CancelOrderUseCase, CreateOrderInput, CreateOrderUseCase, GetOrderUseCase, OrderLineInput,
};
use crate::usecase::payment::StartCheckoutUseCase;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

// ── POST /orders ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub ticket_batch_id: BatchId,
    pub quantity: u32,
    pub coupon_code: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub event_id: EventId,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderSummary>), TicketsServiceError> {
    let idempotency_key = match headers.get(IDEMPOTENCY_KEY_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| TicketsServiceError::validation("Idempotency-Key must be ASCII"))?
                .to_owned(),
        ),
        None => None,
    };
    let usecase = CreateOrderUseCase {
        catalog: state.catalog_repo(),
        orders: state.order_repo(),
        idempotency: state.idempotency_store(),
        idempotency_ttl: state.idempotency_ttl,
    };
    let summary = usecase
        .execute(CreateOrderInput {
            event_id: body.event_id,
            email: body.email,
            full_name: body.full_name,
            phone: body.phone,
            items: body
                .items
                .into_iter()
                .map(|line| OrderLineInput {
                    batch_id: line.ticket_batch_id,
                    quantity: line.quantity,
                    coupon_code: line.coupon_code,
                })
                .collect(),
            idempotency_key,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Order header without lines or attendees, for list endpoints.
#[derive(Serialize)]
pub struct OrderRowResponse {
    pub id: OrderId,
    pub event_id: EventId,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderRowResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            event_id: order.event_id,
            email: order.buyer.email,
            full_name: order.buyer.full_name,
            phone: order.buyer.phone,
            total_amount: order.total_amount,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

// ── GET /orders/{order_id} ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub ticket_batch_id: BatchId,
    pub coupon_id: Option<CouponId>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Serialize)]
pub struct AttendeeResponse {
    pub id: AttendeeId,
    pub ticket_batch_id: BatchId,
    pub full_name: String,
    pub email: String,
    pub ticket_issued: bool,
    pub checked_in: bool,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms_opt")]
    pub checked_in_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub event_id: EventId,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
    pub attendees: Vec<AttendeeResponse>,
}

impl From<OrderAggregate> for OrderResponse {
    fn from(aggregate: OrderAggregate) -> Self {
        let order = aggregate.order;
        Self {
            id: order.id,
            event_id: order.event_id,
            email: order.buyer.email,
            full_name: order.buyer.full_name,
            phone: order.buyer.phone,
            total_amount: order.total_amount,
            status: order.status,
            created_at: order.created_at,
            items: aggregate
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    ticket_batch_id: item.batch_id,
                    coupon_id: item.coupon_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                })
                .collect(),
            attendees: aggregate
                .attendees
                .into_iter()
                .map(|a| AttendeeResponse {
                    id: a.id,
                    ticket_batch_id: a.batch_id,
                    full_name: a.full_name,
                    email: a.email,
                    ticket_issued: a.token.is_some(),
                    checked_in: a.checked_in,
                    checked_in_at: a.checked_in_at,
                })
                .collect(),
        }
    }
}

pub async fn get_order(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>, TicketsServiceError> {
    require_role(&identity, StaffRole::Staff)?;
    let usecase = GetOrderUseCase {
        orders: state.order_repo(),
    };
    let aggregate = usecase.execute(order_id).await?;
    Ok(Json(aggregate.into()))
}

// ── POST /orders/{order_id}/cancel ───────────────────────────────────────────

pub async fn cancel_order(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path(order_id): Path<OrderId>,
) -> Result<StatusCode, TicketsServiceError> {
    require_role(&identity, StaffRole::Staff)?;
    let usecase = CancelOrderUseCase {
        orders: state.order_repo(),
    };
    usecase.execute(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /orders/{order_id}/payment ──────────────────────────────────────────

pub async fn start_checkout(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<CheckoutSession>, TicketsServiceError> {
    let usecase = StartCheckoutUseCase {
        orders: state.order_repo(),
        catalog: state.catalog_repo(),
        provider: state.provider.clone(),
    };
    let session = usecase.execute(order_id).await?;
    Ok(Json(session))
}
