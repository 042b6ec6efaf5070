//! SeaORM-backed storage adapter that satisfies the domain account trait
//! while keeping the database backend swappable (SQLite by default,
//! PostgreSQL via feature flag).
//!
//! Every operation runs under the bounded retry/timeout policy configured at
//! build time, so transient connectivity loss degrades to delayed responses
//! instead of request failures.

mod account_store;
mod builder;
mod entity;
mod migration;
mod retry;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use builder::StorageBuilder;
use carmarket_domain::storage::StorageResult;
pub use retry::RetryPolicy;

/// Shared storage handle used by the HTTP surface and background tasks.
#[derive(Clone)]
pub struct MarketStorage {
    db: Arc<DatabaseConnection>,
    retry: RetryPolicy,
}

impl MarketStorage {
    /// Connects with the default retry policy and ensures the schema exists.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::builder().database_url(database_url).build().await
    }

    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    pub(crate) fn from_connection(db: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self {
            db: Arc::new(db),
            retry,
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    pub(crate) fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}
