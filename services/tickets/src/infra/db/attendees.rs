use std::collections::HashMap;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use ducktickets_domain::id::{AttendeeId, EventId};
use ducktickets_domain::order::OrderStatus;
use ducktickets_tickets_schema::{attendees, events, order_items, orders, ticket_batches};

use super::order_status;
use super::orders::attendee_from_model;
use crate::domain::repository::AttendeeRepository;
use crate::domain::types::{AttendeeListing, BuyerTicket, CheckInTarget};
use crate::error::TicketsServiceError;

#[derive(Clone)]
pub struct DbAttendeeRepository {
    pub db: DatabaseConnection,
}

impl AttendeeRepository for DbAttendeeRepository {
    async fn assign_tokens(
        &self,
        tokens: &[(AttendeeId, String)],
    ) -> Result<u64, TicketsServiceError> {
        let txn = self.db.begin().await.context("begin assign tokens")?;
        let mut assigned = 0;
        for (id, token) in tokens {
            let result = attendees::Entity::update_many()
                .col_expr(attendees::Column::Token, Expr::value(Some(token.clone())))
                .filter(attendees::Column::Id.eq(id.as_uuid()))
                .filter(attendees::Column::Token.is_null())
                .exec(&txn)
                .await
                .context("assign ticket token")?;
            assigned += result.rows_affected;
        }
        txn.commit().await.context("commit assign tokens")?;
        Ok(assigned)
    }

    async fn find_check_in_target(
        &self,
        id: AttendeeId,
    ) -> Result<Option<CheckInTarget>, TicketsServiceError> {
        let Some(attendee) = attendees::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await
            .context("find attendee")?
        else {
            return Ok(None);
        };
        let order = orders::Entity::find_by_id(attendee.order_id)
            .one(&self.db)
            .await
            .context("find attendee order")?
            .context("attendee without order")?;
        let batch = ticket_batches::Entity::find_by_id(attendee.ticket_batch_id)
            .one(&self.db)
            .await
            .context("find attendee batch")?
            .context("attendee without ticket batch")?;
        let event = events::Entity::find_by_id(order.event_id)
            .one(&self.db)
            .await
            .context("find attendee event")?
            .context("order without event")?;

        Ok(Some(CheckInTarget {
            attendee: attendee_from_model(attendee),
            order_status: order_status(&order.status)?,
            event_name: event.name,
            batch_name: batch.name,
        }))
    }

    async fn mark_checked_in(
        &self,
        id: AttendeeId,
        at: DateTime<Utc>,
    ) -> Result<bool, TicketsServiceError> {
        let result = attendees::Entity::update_many()
            .col_expr(attendees::Column::CheckedIn, Expr::value(true))
            .col_expr(attendees::Column::CheckedInAt, Expr::value(Some(at)))
            .filter(attendees::Column::Id.eq(id.as_uuid()))
            .filter(attendees::Column::CheckedIn.eq(false))
            .exec(&self.db)
            .await
            .context("mark attendee checked in")?;
        Ok(result.rows_affected > 0)
    }

    async fn list_paid_for_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<AttendeeListing>, TicketsServiceError> {
        let order_ids: Vec<Uuid> = orders::Entity::find()
            .select_only()
            .column(orders::Column::Id)
            .filter(orders::Column::EventId.eq(event_id.as_uuid()))
            .filter(orders::Column::Status.eq(OrderStatus::Paid.as_str()))
            .into_tuple()
            .all(&self.db)
            .await
            .context("list paid order ids")?;
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let batch_names: HashMap<Uuid, String> = ticket_batches::Entity::find()
            .select_only()
            .columns([ticket_batches::Column::Id, ticket_batches::Column::Name])
            .filter(ticket_batches::Column::EventId.eq(event_id.as_uuid()))
            .into_tuple::<(Uuid, String)>()
            .all(&self.db)
            .await
            .context("list batch names")?
            .into_iter()
            .collect();
        let models = attendees::Entity::find()
            .filter(attendees::Column::OrderId.is_in(order_ids))
            .order_by_asc(attendees::Column::CreatedAt)
            .order_by_asc(attendees::Column::Id)
            .all(&self.db)
            .await
            .context("list paid attendees")?;

        Ok(models
            .into_iter()
            .map(|model| AttendeeListing {
                batch_name: batch_names
                    .get(&model.ticket_batch_id)
                    .cloned()
                    .unwrap_or_default(),
                created_at: model.created_at,
                attendee: attendee_from_model(model),
            })
            .collect())
    }

    async fn list_tickets_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<BuyerTicket>, TicketsServiceError> {
        let orders = orders::Entity::find()
            .filter(orders::Column::Email.eq(email))
            .order_by_desc(orders::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list buyer orders")?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let event_ids: Vec<Uuid> = orders.iter().map(|o| o.event_id).collect();

        let events: HashMap<Uuid, events::Model> = events::Entity::find()
            .filter(events::Column::Id.is_in(event_ids))
            .all(&self.db)
            .await
            .context("load buyer events")?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.is_in(order_ids.clone()))
            .all(&self.db)
            .await
            .context("load buyer order items")?;
        let batch_names: HashMap<Uuid, String> = ticket_batches::Entity::find()
            .select_only()
            .columns([ticket_batches::Column::Id, ticket_batches::Column::Name])
            .filter(ticket_batches::Column::Id.is_in(items.iter().map(|i| i.ticket_batch_id)))
            .into_tuple::<(Uuid, String)>()
            .all(&self.db)
            .await
            .context("load buyer batch names")?
            .into_iter()
            .collect();
        let attendees = attendees::Entity::find()
            .filter(attendees::Column::OrderId.is_in(order_ids))
            .order_by_asc(attendees::Column::CreatedAt)
            .order_by_asc(attendees::Column::Id)
            .all(&self.db)
            .await
            .context("load buyer attendees")?;

        let mut tickets = Vec::with_capacity(attendees.len());
        for order in &orders {
            let event = events
                .get(&order.event_id)
                .context("order without event")?;
            let status = order_status(&order.status)?;
            for attendee in attendees.iter().filter(|a| a.order_id == order.id) {
                let price = items
                    .iter()
                    .find(|i| i.order_id == order.id && i.ticket_batch_id == attendee.ticket_batch_id)
                    .map(|i| i.unit_price)
                    .unwrap_or_default();
                tickets.push(BuyerTicket {
                    attendee_id: attendee.id.into(),
                    attendee_name: attendee.full_name.clone(),
                    order_id: order.id.into(),
                    order_status: status,
                    event_name: event.name.clone(),
                    event_date: event.start_date,
                    event_location: event.location.clone(),
                    batch_name: batch_names
                        .get(&attendee.ticket_batch_id)
                        .cloned()
                        .unwrap_or_default(),
                    price,
                    checked_in: attendee.checked_in,
                });
            }
        }
        Ok(tickets)
    }
}
