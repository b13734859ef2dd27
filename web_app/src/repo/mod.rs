//! Storage of processed webhook event ids.
//!
//! The request path only ever calls [`EventStore::test_and_set`], which checks
//! and records an id in one atomic step. `is_duplicate` and `mark_processed`
//! are kept for inspection and tooling.
//!
//! [`in_memory::InMemoryEventStore`] is volatile and scoped to one process: a
//! restart, or a second instance behind a load balancer, silently reverts to
//! at-least-once delivery. [`sqlite::SqlxSqliteEventStore`] shares the state
//! between every process using the same database file.

pub mod in_memory;
pub mod sqlite;
pub mod sqlite_queries;

use async_trait::async_trait;
use chrono::TimeDelta;
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// True if the id was processed less than the store retention ago.
    async fn is_duplicate(&self, event_id: &str) -> anyhow::Result<bool>;

    /// Records the id as processed now and evicts expired records.
    async fn mark_processed(&self, event_id: &str) -> anyhow::Result<()>;

    /// Records the id unless a record younger than `ttl` already exists.
    ///
    /// Returns `true` when the id was new (or its record had expired).
    async fn test_and_set(&self, event_id: &str, ttl: TimeDelta) -> anyhow::Result<bool>;
}

pub type ImplEventStore = Arc<dyn EventStore>;
