use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};

use ducktickets_core::sea_ext::is_unique_violation;
use ducktickets_domain::id::{BatchId, EventId};
use ducktickets_domain::pagination::PageRequest;
use ducktickets_tickets_schema::{coupons, events, order_items, orders, ticket_batches};

use super::{to_i32, to_u32};
use crate::domain::repository::CatalogRepository;
use crate::domain::types::{Coupon, Event, TicketBatch};
use crate::error::TicketsServiceError;

#[derive(Clone)]
pub struct DbCatalogRepository {
    pub db: DatabaseConnection,
}

impl CatalogRepository for DbCatalogRepository {
    async fn create_event(&self, event: &Event) -> Result<(), TicketsServiceError> {
        events::ActiveModel {
            id: Set(event.id.as_uuid()),
            name: Set(event.name.clone()),
            description: Set(event.description.clone()),
            location: Set(event.location.clone()),
            start_date: Set(event.start_date),
            end_date: Set(event.end_date),
            max_attendees: Set(event.max_attendees.map(to_i32)),
            is_active: Set(event.is_active),
            created_at: Set(event.created_at),
            updated_at: Set(event.created_at),
        }
        .insert(&self.db)
        .await
        .context("create event")?;
        Ok(())
    }

    async fn list_active_events(
        &self,
        page: PageRequest,
    ) -> Result<Vec<Event>, TicketsServiceError> {
        let models = events::Entity::find()
            .filter(events::Column::IsActive.eq(true))
            .order_by_asc(events::Column::StartDate)
            .order_by_asc(events::Column::Id)
            .limit(page.limit())
            .offset(page.offset())
            .all(&self.db)
            .await
            .context("list active events")?;
        Ok(models
            .into_iter()
            .map(event_from_model)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn find_event(&self, id: EventId) -> Result<Option<Event>, TicketsServiceError> {
        let model = events::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await
            .context("find event")?;
        Ok(model.map(event_from_model).transpose()?)
    }

    async fn create_batch(&self, batch: &TicketBatch) -> Result<(), TicketsServiceError> {
        ticket_batches::ActiveModel {
            id: Set(batch.id.as_uuid()),
            event_id: Set(batch.event_id.as_uuid()),
            name: Set(batch.name.clone()),
            description: Set(batch.description.clone()),
            price: Set(batch.price),
            quantity: Set(to_i32(batch.quantity)),
            sold_quantity: Set(to_i32(batch.sold_quantity)),
            sale_start: Set(batch.sale_start),
            sale_end: Set(batch.sale_end),
            is_active: Set(batch.is_active),
            requires_coupon: Set(batch.requires_coupon),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("create ticket batch")?;
        Ok(())
    }

    async fn list_batches(
        &self,
        event_id: EventId,
    ) -> Result<Vec<TicketBatch>, TicketsServiceError> {
        let models = ticket_batches::Entity::find()
            .filter(ticket_batches::Column::EventId.eq(event_id.as_uuid()))
            .order_by_asc(ticket_batches::Column::SaleStart)
            .order_by_asc(ticket_batches::Column::Id)
            .all(&self.db)
            .await
            .context("list ticket batches")?;
        Ok(models
            .into_iter()
            .map(batch_from_model)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn create_coupon(&self, coupon: &Coupon) -> Result<(), TicketsServiceError> {
        let result = coupons::ActiveModel {
            id: Set(coupon.id.as_uuid()),
            code: Set(coupon.code.clone()),
            ticket_batch_id: Set(coupon.batch_id.as_uuid()),
            discount_percent: Set(coupon.discount_percent),
            discount_amount: Set(coupon.discount_amount),
            max_uses: Set(to_i32(coupon.max_uses)),
            used_count: Set(to_i32(coupon.used_count)),
            is_active: Set(coupon.is_active),
            expires_at: Set(coupon.expires_at),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(TicketsServiceError::CouponAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("create coupon").into()),
        }
    }

    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, TicketsServiceError> {
        let model = coupons::Entity::find()
            .filter(coupons::Column::Code.eq(code))
            .one(&self.db)
            .await
            .context("find coupon")?;
        Ok(model.map(coupon_from_model).transpose()?)
    }

    async fn find_batch(&self, id: BatchId) -> Result<Option<TicketBatch>, TicketsServiceError> {
        let model = ticket_batches::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await
            .context("find ticket batch")?;
        Ok(model.map(batch_from_model).transpose()?)
    }

    async fn update_batch(&self, batch: &TicketBatch) -> Result<bool, TicketsServiceError> {
        let quantity = to_i32(batch.quantity);
        let result = ticket_batches::Entity::update_many()
            .col_expr(ticket_batches::Column::Name, Expr::value(batch.name.clone()))
            .col_expr(ticket_batches::Column::Price, Expr::value(batch.price))
            .col_expr(ticket_batches::Column::Quantity, Expr::value(quantity))
            .col_expr(ticket_batches::Column::IsActive, Expr::value(batch.is_active))
            .filter(ticket_batches::Column::Id.eq(batch.id.as_uuid()))
            .filter(ticket_batches::Column::SoldQuantity.lte(quantity))
            .exec(&self.db)
            .await
            .context("update ticket batch")?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_batch(&self, id: BatchId) -> Result<bool, TicketsServiceError> {
        let txn = self.db.begin().await.context("begin delete batch")?;

        // Reservations update the batch row, so this lock waits them out.
        ticket_batches::Entity::find_by_id(id.as_uuid())
            .lock_exclusive()
            .one(&txn)
            .await
            .context("lock ticket batch")?;
        let ordered = order_items::Entity::find()
            .filter(order_items::Column::TicketBatchId.eq(id.as_uuid()))
            .count(&txn)
            .await
            .context("count batch order items")?;
        if ordered > 0 {
            return Ok(false);
        }

        ticket_batches::Entity::delete_by_id(id.as_uuid())
            .exec(&txn)
            .await
            .context("delete ticket batch")?;
        txn.commit().await.context("commit delete batch")?;
        Ok(true)
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, TicketsServiceError> {
        let txn = self.db.begin().await.context("begin delete event")?;

        events::Entity::find_by_id(id.as_uuid())
            .lock_exclusive()
            .one(&txn)
            .await
            .context("lock event")?;
        let ordered = orders::Entity::find()
            .filter(orders::Column::EventId.eq(id.as_uuid()))
            .count(&txn)
            .await
            .context("count event orders")?;
        if ordered > 0 {
            return Ok(false);
        }

        events::Entity::delete_by_id(id.as_uuid())
            .exec(&txn)
            .await
            .context("delete event")?;
        txn.commit().await.context("commit delete event")?;
        Ok(true)
    }

    async fn count_events(&self) -> Result<(u64, u64), TicketsServiceError> {
        let total = events::Entity::find()
            .count(&self.db)
            .await
            .context("count events")?;
        let active = events::Entity::find()
            .filter(events::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .context("count active events")?;
        Ok((total, active))
    }
}

pub(super) fn event_from_model(model: events::Model) -> anyhow::Result<Event> {
    Ok(Event {
        id: model.id.into(),
        name: model.name,
        description: model.description,
        location: model.location,
        start_date: model.start_date,
        end_date: model.end_date,
        max_attendees: model
            .max_attendees
            .map(|n| to_u32(n, "max_attendees"))
            .transpose()?,
        is_active: model.is_active,
        created_at: model.created_at,
    })
}

pub(super) fn batch_from_model(model: ticket_batches::Model) -> anyhow::Result<TicketBatch> {
    Ok(TicketBatch {
        id: model.id.into(),
        event_id: model.event_id.into(),
        name: model.name,
        description: model.description,
        price: model.price,
        quantity: to_u32(model.quantity, "quantity")?,
        sold_quantity: to_u32(model.sold_quantity, "sold_quantity")?,
        sale_start: model.sale_start,
        sale_end: model.sale_end,
        is_active: model.is_active,
        requires_coupon: model.requires_coupon,
    })
}

fn coupon_from_model(model: coupons::Model) -> anyhow::Result<Coupon> {
    Ok(Coupon {
        id: model.id.into(),
        code: model.code,
        batch_id: model.ticket_batch_id.into(),
        discount_percent: model.discount_percent,
        discount_amount: model.discount_amount,
        max_uses: to_u32(model.max_uses, "max_uses")?,
        used_count: to_u32(model.used_count, "used_count")?,
        is_active: model.is_active,
        expires_at: model.expires_at,
    })
}
