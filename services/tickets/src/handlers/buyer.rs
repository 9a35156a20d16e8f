use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ducktickets_domain::id::{AttendeeId, OrderId};
use ducktickets_domain::order::OrderStatus;

use super::orders::OrderRowResponse;
use crate::domain::types::BuyerTicket;
use crate::error::TicketsServiceError;
use crate::state::AppState;
use crate::usecase::buyer::{ListBuyerOrdersUseCase, ListBuyerTicketsUseCase};

#[derive(Deserialize)]
pub struct BuyerQuery {
    pub email: String,
}

// ── GET /buyer/orders?email= ─────────────────────────────────────────────────

pub async fn list_buyer_orders(
    State(state): State<AppState>,
    Query(query): Query<BuyerQuery>,
) -> Result<Json<Vec<OrderRowResponse>>, TicketsServiceError> {
    let usecase = ListBuyerOrdersUseCase {
        orders: state.order_repo(),
    };
    let orders = usecase.execute(&query.email).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

// ── GET /buyer/tickets?email= ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct BuyerTicketResponse {
    pub id: AttendeeId,
    pub attendee_name: String,
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub event_name: String,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    pub event_date: DateTime<Utc>,
    pub event_location: Option<String>,
    pub batch_name: String,
    pub price: Decimal,
    pub checked_in: bool,
}

impl From<BuyerTicket> for BuyerTicketResponse {
    fn from(ticket: BuyerTicket) -> Self {
        Self {
            id: ticket.attendee_id,
            attendee_name: ticket.attendee_name,
            order_id: ticket.order_id,
            order_status: ticket.order_status,
            event_name: ticket.event_name,
            event_date: ticket.event_date,
            event_location: ticket.event_location,
            batch_name: ticket.batch_name,
            price: ticket.price,
            checked_in: ticket.checked_in,
        }
    }
}

pub async fn list_buyer_tickets(
    State(state): State<AppState>,
    Query(query): Query<BuyerQuery>,
) -> Result<Json<Vec<BuyerTicketResponse>>, TicketsServiceError> {
    let usecase = ListBuyerTicketsUseCase {
        attendees: state.attendee_repo(),
    };
    let tickets = usecase.execute(&query.email).await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}
