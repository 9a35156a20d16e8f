use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, TransactionTrait, sea_query::Expr,
};
use tracing::debug;
use uuid::Uuid;

use ducktickets_domain::id::OrderId;
use ducktickets_domain::order::OrderStatus;
use ducktickets_domain::payment::PaymentStatus;
use ducktickets_tickets_schema::{orders, payments};

use super::outbox::insert_outbox;
use super::{order_status, payment_status};
use crate::domain::repository::PaymentRepository;
use crate::domain::types::{OutboxMessage, PaymentUpdate, ReconcileOutcome, WorkItem};
use crate::error::TicketsServiceError;

#[derive(Clone)]
pub struct DbPaymentRepository {
    pub db: DatabaseConnection,
    /// Provider name stored on new payment rows.
    pub provider: &'static str,
}

impl PaymentRepository for DbPaymentRepository {
    async fn reconcile(
        &self,
        order_id: OrderId,
        update: &PaymentUpdate,
        event_hash: &str,
    ) -> Result<ReconcileOutcome, TicketsServiceError> {
        let txn = self.db.begin().await.context("begin reconcile")?;

        // 1. Order row lock serializes every event for this order
        let Some(order) = orders::Entity::find_by_id(order_id.as_uuid())
            .lock_exclusive()
            .one(&txn)
            .await
            .context("lock order")?
        else {
            return Ok(ReconcileOutcome::OrderNotFound);
        };
        let order_status = order_status(&order.status)?;

        // 2. Decide against the stored payment state
        let existing = payments::Entity::find()
            .filter(payments::Column::ExternalId.eq(update.external_id.as_str()))
            .lock_exclusive()
            .one(&txn)
            .await
            .context("lock payment")?;
        let now = Utc::now();
        match existing {
            Some(stored) => {
                let stored_status = payment_status(&stored.status)?;
                if stored.last_event_hash.as_deref() == Some(event_hash)
                    || !stored_status.accepts(update.status)
                {
                    debug!(
                        external_id = %update.external_id,
                        stored = %stored_status,
                        incoming = %update.status,
                        "payment event not applied"
                    );
                    return Ok(ReconcileOutcome::Duplicate);
                }
                payments::ActiveModel {
                    id: Set(stored.id),
                    amount: Set(update.amount),
                    status: Set(update.status.as_str().to_owned()),
                    payment_method: Set(update.payment_method.clone()),
                    raw: Set(update.raw.clone()),
                    last_event_hash: Set(Some(event_hash.to_owned())),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .update(&txn)
                .await
                .context("update payment")?;
            }
            None => {
                payments::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    order_id: Set(order_id.as_uuid()),
                    external_id: Set(update.external_id.clone()),
                    provider: Set(self.provider.to_owned()),
                    amount: Set(update.amount),
                    status: Set(update.status.as_str().to_owned()),
                    payment_method: Set(update.payment_method.clone()),
                    raw: Set(update.raw.clone()),
                    last_event_hash: Set(Some(event_hash.to_owned())),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await
                .context("insert payment")?;
            }
        }

        // 3. Approval pays a pending order and queues ticket issue atomically
        let mut order_paid = false;
        if update.status == PaymentStatus::Approved && order_status == OrderStatus::Pending {
            let paid = orders::Entity::update_many()
                .col_expr(orders::Column::Status, Expr::value(OrderStatus::Paid.as_str()))
                .col_expr(orders::Column::UpdatedAt, Expr::value(now))
                .filter(orders::Column::Id.eq(order_id.as_uuid()))
                .filter(orders::Column::Status.eq(OrderStatus::Pending.as_str()))
                .exec(&txn)
                .await
                .context("mark order paid")?;
            order_paid = paid.rows_affected > 0;
            if order_paid {
                let message = OutboxMessage::for_work(&WorkItem::IssueTickets { order_id })
                    .context("encode ticket issue")?;
                insert_outbox(&txn, &message)
                    .await
                    .context("enqueue ticket issue")?;
            }
        }

        txn.commit().await.context("commit reconcile")?;
        Ok(ReconcileOutcome::Applied {
            order_id,
            status: update.status,
            order_paid,
        })
    }
}
