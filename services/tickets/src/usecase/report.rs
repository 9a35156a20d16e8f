//! Admin views over sales: counters, attendee lists and order lists.

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::Serialize;

use ducktickets_domain::id::EventId;
use ducktickets_domain::pagination::PageRequest;

use crate::domain::repository::{AttendeeRepository, CatalogRepository, OrderRepository};
use crate::domain::types::{AttendeeListing, Order, StatusCounters};
use crate::error::TicketsServiceError;

// ── Status ───────────────────────────────────────────────────────────────────

pub struct GetStatusUseCase<C: CatalogRepository, R: OrderRepository> {
    pub catalog: C,
    pub orders: R,
}

impl<C: CatalogRepository, R: OrderRepository> GetStatusUseCase<C, R> {
    pub async fn execute(&self) -> Result<StatusCounters, TicketsServiceError> {
        let (total_events, active_events) = self.catalog.count_events().await?;
        let (total_orders, paid_orders) = self.orders.count_orders().await?;
        Ok(StatusCounters {
            total_events,
            active_events,
            total_orders,
            paid_orders,
        })
    }
}

// ── ListEventAttendees / ExportAttendees ─────────────────────────────────────

pub struct ListEventAttendeesUseCase<C: CatalogRepository, A: AttendeeRepository> {
    pub catalog: C,
    pub attendees: A,
}

impl<C: CatalogRepository, A: AttendeeRepository> ListEventAttendeesUseCase<C, A> {
    /// Attendees whose order is paid. Pending, cancelled and expired orders are left out.
    pub async fn execute(
        &self,
        event_id: EventId,
    ) -> Result<Vec<AttendeeListing>, TicketsServiceError> {
        self.catalog
            .find_event(event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        self.attendees.list_paid_for_event(event_id).await
    }

    /// Same list as a CSV document with a header row.
    pub async fn export_csv(&self, event_id: EventId) -> Result<Vec<u8>, TicketsServiceError> {
        let listings = self.execute(event_id).await?;
        Ok(attendees_csv(&listings)?)
    }
}

const CSV_HEADER: [&str; 10] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Batch",
    "Checked in",
    "Checked in at",
    "Ticket",
    "Order",
    "Created",
];

/// One CSV record, fields in [`CSV_HEADER`] order.
#[derive(Serialize)]
struct AttendeeCsvRow<'a> {
    id: String,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    batch: &'a str,
    checked_in: &'static str,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms_opt")]
    checked_in_at: Option<DateTime<Utc>>,
    ticket: &'a str,
    order: String,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    created_at: DateTime<Utc>,
}

pub fn attendees_csv(listings: &[AttendeeListing]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .context("write attendee header")?;
    for listing in listings {
        let a = &listing.attendee;
        writer
            .serialize(AttendeeCsvRow {
                id: a.id.to_string(),
                name: &a.full_name,
                email: &a.email,
                phone: a.phone.as_deref().unwrap_or_default(),
                batch: &listing.batch_name,
                checked_in: if a.checked_in { "yes" } else { "no" },
                checked_in_at: a.checked_in_at,
                ticket: a.token.as_deref().unwrap_or_default(),
                order: a.order_id.to_string(),
                created_at: listing.created_at,
            })
            .context("write attendee row")?;
    }
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("flush attendee csv")
}

// ── ListEventOrders ──────────────────────────────────────────────────────────

pub struct ListEventOrdersUseCase<C: CatalogRepository, R: OrderRepository> {
    pub catalog: C,
    pub orders: R,
}

impl<C: CatalogRepository, R: OrderRepository> ListEventOrdersUseCase<C, R> {
    pub async fn execute(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> Result<Vec<Order>, TicketsServiceError> {
        self.catalog
            .find_event(event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        self.orders.list_for_event(event_id, page.clamped()).await
    }
}
