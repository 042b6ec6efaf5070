use std::time::Duration;

use sea_orm::{ConnectOptions, Database};

use carmarket_domain::storage::{StorageError, StorageResult};

use crate::{migration::run_migrations, retry::with_retry, MarketStorage, RetryPolicy};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct StorageBuilder {
    database_url: Option<String>,
    retry: RetryPolicy,
    verbose_logging: bool,
}

impl StorageBuilder {
    pub fn new() -> Self {
        Self {
            database_url: None,
            retry: RetryPolicy::default(),
            verbose_logging: false,
        }
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Enables per-statement SQL logging. Development only; the statements
    /// can contain user data.
    pub fn verbose_logging(mut self, enabled: bool) -> Self {
        self.verbose_logging = enabled;
        self
    }

    pub async fn build(self) -> StorageResult<MarketStorage> {
        let url = self
            .database_url
            .ok_or_else(|| StorageError::Database("missing database url".into()))?;

        let mut options = ConnectOptions::new(url);
        options
            .connect_timeout(CONNECT_TIMEOUT)
            .sqlx_logging(self.verbose_logging);

        let db = with_retry(&self.retry, "connect", || {
            Database::connect(options.clone())
        })
        .await?;
        run_migrations(&db).await?;
        Ok(MarketStorage::from_connection(db, self.retry))
    }
}

impl Default for StorageBuilder {
    fn default() -> Self {
        Self::new()
    }
}
