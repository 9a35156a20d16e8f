use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
    sea_query::Expr,
};

use ducktickets_core::sea_ext::is_unique_violation;
use ducktickets_domain::id::{BatchId, CouponId, EventId, OrderId};
use ducktickets_domain::order::OrderStatus;
use ducktickets_domain::pagination::PageRequest;
use ducktickets_tickets_schema::{attendees, coupons, events, order_items, orders, ticket_batches};

use super::{order_status, to_i32, to_u32};
use crate::domain::repository::OrderRepository;
use crate::domain::types::{
    Attendee, Buyer, CreateOrderOutcome, Order, OrderAggregate, OrderDraft, OrderItem,
};
use crate::error::TicketsServiceError;

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl OrderRepository for DbOrderRepository {
    async fn create_order(
        &self,
        draft: &OrderDraft,
        key_released_before: DateTime<Utc>,
    ) -> Result<CreateOrderOutcome, TicketsServiceError> {
        // Dropping `txn` without commit rolls back every step below.
        let txn = self.db.begin().await.context("begin create order")?;

        // 1. Free the key if its holder is older than the idempotency window
        if let Some(key) = &draft.order.idempotency_key {
            orders::Entity::update_many()
                .col_expr(orders::Column::IdempotencyKey, Expr::value(None::<String>))
                .filter(orders::Column::IdempotencyKey.eq(key.as_str()))
                .filter(orders::Column::CreatedAt.lt(key_released_before))
                .exec(&txn)
                .await
                .context("release stale idempotency key")?;
        }

        // 2. Insert the order; the unique key decides concurrent twins
        match order_active_model(&draft.order).insert(&txn).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(CreateOrderOutcome::IdempotencyConflict),
            Err(e) => return Err(anyhow::Error::new(e).context("insert order").into()),
        }

        // 3. Event ceiling, serialized on the event row
        if let Some(max) = draft.max_attendees {
            lock_event(&txn, draft.order.event_id).await?;
            let sold = sold_for_event(&txn, draft.order.event_id).await?;
            if sold + u64::from(draft.ticket_count()) > u64::from(max) {
                return Err(TicketsServiceError::InsufficientInventory);
            }
        }

        // 4. Reserve per batch and redeem coupons, locking rows in id order
        let mut reservations: Vec<&OrderItem> = draft.items.iter().collect();
        reservations.sort_by_key(|item| item.batch_id);
        for item in reservations {
            reserve_batch(&txn, item.batch_id, item.quantity).await?;
            if let Some(coupon_id) = item.coupon_id {
                redeem_coupon(&txn, coupon_id).await?;
            }
        }

        // 5. Lines and attendee placeholders
        for item in &draft.items {
            order_items::ActiveModel {
                id: Set(item.id.as_uuid()),
                order_id: Set(item.order_id.as_uuid()),
                ticket_batch_id: Set(item.batch_id.as_uuid()),
                coupon_id: Set(item.coupon_id.map(|c| c.as_uuid())),
                quantity: Set(to_i32(item.quantity)),
                unit_price: Set(item.unit_price),
                total_price: Set(item.total_price),
            }
            .insert(&txn)
            .await
            .context("insert order item")?;
        }
        let now = Utc::now();
        for attendee in &draft.attendees {
            attendees::ActiveModel {
                id: Set(attendee.id.as_uuid()),
                order_id: Set(attendee.order_id.as_uuid()),
                ticket_batch_id: Set(attendee.batch_id.as_uuid()),
                full_name: Set(attendee.full_name.clone()),
                email: Set(attendee.email.clone()),
                phone: Set(attendee.phone.clone()),
                token: Set(attendee.token.clone()),
                checked_in: Set(false),
                checked_in_at: Set(None),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .context("insert attendee")?;
        }

        txn.commit().await.context("commit create order")?;
        Ok(CreateOrderOutcome::Created)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, TicketsServiceError> {
        let model = orders::Entity::find_by_id(id.as_uuid())
            .one(&self.db)
            .await
            .context("find order")?;
        Ok(model.map(order_from_model).transpose()?)
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Order>, TicketsServiceError> {
        let model = orders::Entity::find()
            .filter(orders::Column::IdempotencyKey.eq(key))
            .one(&self.db)
            .await
            .context("find order by idempotency key")?;
        Ok(model.map(order_from_model).transpose()?)
    }

    async fn find_aggregate(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderAggregate>, TicketsServiceError> {
        let Some(order) = self.find_order(id).await? else {
            return Ok(None);
        };
        let items = order_items::Entity::find()
            .filter(order_items::Column::OrderId.eq(id.as_uuid()))
            .order_by_asc(order_items::Column::Id)
            .all(&self.db)
            .await
            .context("list order items")?;
        let attendees = attendees::Entity::find()
            .filter(attendees::Column::OrderId.eq(id.as_uuid()))
            .order_by_asc(attendees::Column::Id)
            .all(&self.db)
            .await
            .context("list order attendees")?;
        Ok(Some(OrderAggregate {
            order,
            items: items
                .into_iter()
                .map(item_from_model)
                .collect::<anyhow::Result<_>>()?,
            attendees: attendees.into_iter().map(attendee_from_model).collect(),
        }))
    }

    async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, TicketsServiceError> {
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(to.as_str()))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Id.eq(id.as_uuid()))
            .filter(orders::Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .context("transition order")?;
        Ok(result.rows_affected > 0)
    }

    async fn expire_pending_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, TicketsServiceError> {
        let result = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(OrderStatus::Expired.as_str()))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(orders::Column::Status.eq(OrderStatus::Pending.as_str()))
            .filter(orders::Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await
            .context("expire pending orders")?;
        Ok(result.rows_affected)
    }

    async fn list_for_event(
        &self,
        event_id: EventId,
        page: PageRequest,
    ) -> Result<Vec<Order>, TicketsServiceError> {
        let models = orders::Entity::find()
            .filter(orders::Column::EventId.eq(event_id.as_uuid()))
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .limit(page.limit())
            .offset(page.offset())
            .all(&self.db)
            .await
            .context("list event orders")?;
        Ok(models
            .into_iter()
            .map(order_from_model)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<Order>, TicketsServiceError> {
        let models = orders::Entity::find()
            .filter(orders::Column::Email.eq(email))
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .all(&self.db)
            .await
            .context("list orders by email")?;
        Ok(models
            .into_iter()
            .map(order_from_model)
            .collect::<anyhow::Result<_>>()?)
    }

    async fn count_orders(&self) -> Result<(u64, u64), TicketsServiceError> {
        let total = orders::Entity::find()
            .count(&self.db)
            .await
            .context("count orders")?;
        let paid = orders::Entity::find()
            .filter(orders::Column::Status.eq(OrderStatus::Paid.as_str()))
            .count(&self.db)
            .await
            .context("count paid orders")?;
        Ok((total, paid))
    }
}

/// Add `quantity` to the batch's sold count unless that would oversell it.
async fn reserve_batch<C: ConnectionTrait>(
    conn: &C,
    batch_id: BatchId,
    quantity: u32,
) -> Result<(), TicketsServiceError> {
    let quantity = to_i32(quantity);
    let reserved = ticket_batches::Entity::update_many()
        .col_expr(
            ticket_batches::Column::SoldQuantity,
            Expr::col(ticket_batches::Column::SoldQuantity).add(quantity),
        )
        .filter(ticket_batches::Column::Id.eq(batch_id.as_uuid()))
        .filter(
            Expr::col(ticket_batches::Column::SoldQuantity)
                .lte(Expr::col(ticket_batches::Column::Quantity).sub(quantity)),
        )
        .exec(conn)
        .await
        .context("reserve ticket batch")?;
    if reserved.rows_affected == 0 {
        return Err(TicketsServiceError::InsufficientInventory);
    }
    Ok(())
}

/// Count one use of an active coupon that still has uses left.
async fn redeem_coupon<C: ConnectionTrait>(
    conn: &C,
    coupon_id: CouponId,
) -> Result<(), TicketsServiceError> {
    let redeemed = coupons::Entity::update_many()
        .col_expr(
            coupons::Column::UsedCount,
            Expr::col(coupons::Column::UsedCount).add(1),
        )
        .filter(coupons::Column::Id.eq(coupon_id.as_uuid()))
        .filter(coupons::Column::IsActive.eq(true))
        .filter(Expr::col(coupons::Column::UsedCount).lt(Expr::col(coupons::Column::MaxUses)))
        .exec(conn)
        .await
        .context("redeem coupon")?;
    if redeemed.rows_affected == 0 {
        return Err(TicketsServiceError::InvalidCoupon);
    }
    Ok(())
}

async fn lock_event(txn: &DatabaseTransaction, event_id: EventId) -> anyhow::Result<()> {
    events::Entity::find_by_id(event_id.as_uuid())
        .lock_exclusive()
        .one(txn)
        .await
        .context("lock event")?
        .context("event vanished during order creation")?;
    Ok(())
}

/// Tickets sold across every batch of the event. Call with the event row locked.
async fn sold_for_event(txn: &DatabaseTransaction, event_id: EventId) -> anyhow::Result<u64> {
    let sold: Vec<i32> = ticket_batches::Entity::find()
        .select_only()
        .column(ticket_batches::Column::SoldQuantity)
        .filter(ticket_batches::Column::EventId.eq(event_id.as_uuid()))
        .into_tuple()
        .all(txn)
        .await
        .context("load sold counts")?;
    Ok(sold.into_iter().map(|n| u64::try_from(n).unwrap_or(0)).sum())
}

fn order_active_model(order: &Order) -> orders::ActiveModel {
    orders::ActiveModel {
        id: Set(order.id.as_uuid()),
        event_id: Set(order.event_id.as_uuid()),
        email: Set(order.buyer.email.clone()),
        full_name: Set(order.buyer.full_name.clone()),
        phone: Set(order.buyer.phone.clone()),
        total_amount: Set(order.total_amount),
        status: Set(order.status.as_str().to_owned()),
        idempotency_key: Set(order.idempotency_key.clone()),
        request_hash: Set(order.request_hash.clone()),
        created_at: Set(order.created_at),
        updated_at: Set(order.updated_at),
    }
}

pub(super) fn order_from_model(model: orders::Model) -> anyhow::Result<Order> {
    Ok(Order {
        id: model.id.into(),
        event_id: model.event_id.into(),
        buyer: Buyer {
            email: model.email,
            full_name: model.full_name,
            phone: model.phone,
        },
        total_amount: model.total_amount,
        status: order_status(&model.status)?,
        idempotency_key: model.idempotency_key,
        request_hash: model.request_hash,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn item_from_model(model: order_items::Model) -> anyhow::Result<OrderItem> {
    Ok(OrderItem {
        id: model.id.into(),
        order_id: model.order_id.into(),
        batch_id: model.ticket_batch_id.into(),
        coupon_id: model.coupon_id.map(Into::into),
        quantity: to_u32(model.quantity, "quantity")?,
        unit_price: model.unit_price,
        total_price: model.total_price,
    })
}

pub(super) fn attendee_from_model(model: attendees::Model) -> Attendee {
    Attendee {
        id: model.id.into(),
        order_id: model.order_id.into(),
        batch_id: model.ticket_batch_id.into(),
        full_name: model.full_name,
        email: model.email,
        phone: model.phone,
        token: model.token,
        checked_in: model.checked_in,
        checked_in_at: model.checked_in_at,
    }
}
