use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use ducktickets_auth_types::identity::StaffIdentity;
use ducktickets_domain::id::{AttendeeId, EventId, OrderId};
use ducktickets_domain::pagination::PageRequest;
use ducktickets_domain::staff::StaffRole;

use super::orders::OrderRowResponse;
use super::require_role;
use crate::domain::types::{AttendeeListing, StatusCounters};
use crate::error::TicketsServiceError;
use crate::state::AppState;
use crate::usecase::report::{GetStatusUseCase, ListEventAttendeesUseCase, ListEventOrdersUseCase};

// ── GET /admin/status ────────────────────────────────────────────────────────

pub async fn get_status(
    State(state): State<AppState>,
    identity: StaffIdentity,
) -> Result<Json<StatusCounters>, TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = GetStatusUseCase {
        catalog: state.catalog_repo(),
        orders: state.order_repo(),
    };
    Ok(Json(usecase.execute().await?))
}

// ── GET /events/{event_id}/attendees ─────────────────────────────────────────

#[derive(Serialize)]
pub struct AttendeeListingResponse {
    pub id: AttendeeId,
    pub order_id: OrderId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub batch_name: String,
    pub ticket_issued: bool,
    pub checked_in: bool,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms_opt")]
    pub checked_in_at: Option<DateTime<Utc>>,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<AttendeeListing> for AttendeeListingResponse {
    fn from(listing: AttendeeListing) -> Self {
        let a = listing.attendee;
        Self {
            id: a.id,
            order_id: a.order_id,
            full_name: a.full_name,
            email: a.email,
            phone: a.phone,
            batch_name: listing.batch_name,
            ticket_issued: a.token.is_some(),
            checked_in: a.checked_in,
            checked_in_at: a.checked_in_at,
            created_at: listing.created_at,
        }
    }
}

pub async fn list_attendees(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path(event_id): Path<EventId>,
) -> Result<Json<Vec<AttendeeListingResponse>>, TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = ListEventAttendeesUseCase {
        catalog: state.catalog_repo(),
        attendees: state.attendee_repo(),
    };
    let listings = usecase.execute(event_id).await?;
    Ok(Json(listings.into_iter().map(Into::into).collect()))
}

// ── GET /events/{event_id}/attendees.csv ─────────────────────────────────────

pub async fn export_attendees(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path(event_id): Path<EventId>,
) -> Result<impl IntoResponse, TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = ListEventAttendeesUseCase {
        catalog: state.catalog_repo(),
        attendees: state.attendee_repo(),
    };
    let csv = usecase.export_csv(event_id).await?;
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"attendees-{event_id}.csv\""),
        ),
    ];
    Ok((headers, csv))
}

// ── GET /events/{event_id}/orders ────────────────────────────────────────────

pub async fn list_event_orders(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Path(event_id): Path<EventId>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<OrderRowResponse>>, TicketsServiceError> {
    require_role(&identity, StaffRole::Admin)?;
    let usecase = ListEventOrdersUseCase {
        catalog: state.catalog_repo(),
        orders: state.order_repo(),
    };
    let orders = usecase.execute(event_id, page).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}
