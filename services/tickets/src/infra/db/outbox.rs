use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, LockBehavior, LockType, OnConflict},
};
use uuid::Uuid;

use ducktickets_tickets_schema::outbox_events;

use super::to_u32;
use crate::domain::repository::OutboxRepository;
use crate::domain::types::{ClaimedMessage, OutboxMessage};
use crate::error::TicketsServiceError;

#[derive(Clone)]
pub struct DbOutboxRepository {
    pub db: DatabaseConnection,
}

/// Insert unless the idempotency key is taken. Usable inside a transaction.
pub(super) async fn insert_outbox<C: ConnectionTrait>(
    conn: &C,
    message: &OutboxMessage,
) -> Result<bool, DbErr> {
    let now = Utc::now();
    let row = outbox_events::ActiveModel {
        id: Set(message.id),
        kind: Set(message.kind.clone()),
        payload: Set(message.payload.clone()),
        idempotency_key: Set(message.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    };
    let inserted = outbox_events::Entity::insert(row)
        .on_conflict(
            OnConflict::column(outbox_events::Column::IdempotencyKey)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(inserted > 0)
}

impl OutboxRepository for DbOutboxRepository {
    async fn enqueue(&self, message: &OutboxMessage) -> Result<bool, TicketsServiceError> {
        Ok(insert_outbox(&self.db, message)
            .await
            .context("enqueue outbox event")?)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<ClaimedMessage>, TicketsServiceError> {
        let txn = self.db.begin().await.context("begin outbox claim")?;
        let rows = outbox_events::Entity::find()
            .filter(outbox_events::Column::ProcessedAt.is_null())
            .filter(outbox_events::Column::FailedAt.is_null())
            .filter(outbox_events::Column::NextAttemptAt.lte(now))
            .order_by_asc(outbox_events::Column::NextAttemptAt)
            .limit(limit)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .all(&txn)
            .await
            .context("select due outbox events")?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        outbox_events::Entity::update_many()
            .col_expr(outbox_events::Column::NextAttemptAt, Expr::value(lease_until))
            .filter(outbox_events::Column::Id.is_in(ids))
            .exec(&txn)
            .await
            .context("lease outbox events")?;
        txn.commit().await.context("commit outbox claim")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                Ok(ClaimedMessage {
                    id: row.id,
                    kind: row.kind,
                    payload: row.payload,
                    attempts: to_u32(row.attempts, "attempts")?,
                })
            })
            .collect::<anyhow::Result<_>>()?)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), TicketsServiceError> {
        outbox_events::Entity::update_many()
            .col_expr(outbox_events::Column::ProcessedAt, Expr::value(Some(Utc::now())))
            .filter(outbox_events::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("mark outbox event processed")?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        retry_at: Option<DateTime<Utc>>,
    ) -> Result<(), TicketsServiceError> {
        let update = outbox_events::Entity::update_many()
            .col_expr(
                outbox_events::Column::Attempts,
                Expr::col(outbox_events::Column::Attempts).add(1),
            )
            .col_expr(outbox_events::Column::LastError, Expr::value(Some(error.to_owned())));
        let update = match retry_at {
            Some(at) => update.col_expr(outbox_events::Column::NextAttemptAt, Expr::value(at)),
            None => update.col_expr(outbox_events::Column::FailedAt, Expr::value(Some(Utc::now()))),
        };
        update
            .filter(outbox_events::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("mark outbox event failed")?;
        Ok(())
    }
}
