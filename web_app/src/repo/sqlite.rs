use async_trait::async_trait;
use chrono::TimeDelta;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::{EventStore, sqlite_queries};
use crate::clock::Clock;

/// Event store shared by every process using the same SQLite database.
///
/// `processed_at` is stored as unix milliseconds so that expiration checks are
/// plain integer comparisons inside SQLite.
#[derive(Clone)]
pub struct SqlxSqliteEventStore {
    pub db_pool: SqlitePool,
    pub retention: TimeDelta,
    pub clock: Arc<dyn Clock>,
}

impl SqlxSqliteEventStore {
    /// Creates the `processed_events` table when it does not exist yet.
    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(sqlx::query(sqlite_queries::QUERY_CREATE_PROCESSED_EVENTS)
            .execute(&self.db_pool)
            .await
            .map(|_| ())?)
    }

    async fn delete_expired(&self, cutoff_ms: i64) -> anyhow::Result<()> {
        Ok(sqlx::query(sqlite_queries::QUERY_DELETE_EXPIRED_EVENTS)
            .bind(cutoff_ms)
            .execute(&self.db_pool)
            .await
            .map(|_| ())?)
    }
}

#[async_trait]
impl EventStore for SqlxSqliteEventStore {
    async fn is_duplicate(&self, event_id: &str) -> anyhow::Result<bool> {
        let now_ms = self.clock.now().timestamp_millis();
        let processed_at: Option<i64> = sqlx::query_scalar(sqlite_queries::QUERY_GET_PROCESSED_AT)
            .bind(event_id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(processed_at.is_some_and(|at| now_ms - at < self.retention.num_milliseconds()))
    }

    async fn mark_processed(&self, event_id: &str) -> anyhow::Result<()> {
        let now_ms = self.clock.now().timestamp_millis();

        sqlx::query(sqlite_queries::QUERY_UPSERT_PROCESSED_EVENT)
            .bind(event_id)
            .bind(now_ms)
            .execute(&self.db_pool)
            .await?;

        self.delete_expired(now_ms - self.retention.num_milliseconds())
            .await
    }

    async fn test_and_set(&self, event_id: &str, ttl: TimeDelta) -> anyhow::Result<bool> {
        let now_ms = self.clock.now().timestamp_millis();
        let cutoff_ms = now_ms - ttl.num_milliseconds();

        let was_new = sqlx::query(sqlite_queries::QUERY_TEST_AND_SET_PROCESSED_EVENT)
            .bind(event_id)
            .bind(now_ms)
            .bind(cutoff_ms)
            .execute(&self.db_pool)
            .await?
            .rows_affected()
            == 1;

        if was_new {
            self.delete_expired(cutoff_ms).await?;
        }

        Ok(was_new)
    }
}
