use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    sea_query::OnConflict,
};

use ducktickets_tickets_schema::idempotency_keys;

use crate::domain::repository::IdempotencyStore;
use crate::domain::types::CachedResponse;
use crate::error::TicketsServiceError;

#[derive(Clone)]
pub struct DbIdempotencyStore {
    pub db: DatabaseConnection,
}

impl IdempotencyStore for DbIdempotencyStore {
    async fn find_fresh(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedResponse>, TicketsServiceError> {
        let model = idempotency_keys::Entity::find_by_id(key.to_owned())
            .filter(idempotency_keys::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
            .context("find idempotency key")?;
        Ok(model.map(|m| CachedResponse {
            request_hash: m.request_hash,
            response: m.response,
        }))
    }

    async fn save(
        &self,
        key: &str,
        cached: &CachedResponse,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TicketsServiceError> {
        let row = idempotency_keys::ActiveModel {
            key: Set(key.to_owned()),
            response: Set(cached.response.clone()),
            request_hash: Set(cached.request_hash.clone()),
            created_at: Set(Utc::now()),
            expires_at: Set(expires_at),
        };
        idempotency_keys::Entity::insert(row)
            .on_conflict(
                OnConflict::column(idempotency_keys::Column::Key)
                    .update_columns([
                        idempotency_keys::Column::Response,
                        idempotency_keys::Column::RequestHash,
                        idempotency_keys::Column::CreatedAt,
                        idempotency_keys::Column::ExpiresAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("save idempotency response")?;
        Ok(())
    }
}
