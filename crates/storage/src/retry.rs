//! Bounded retry with capped exponential backoff for database operations.
//!
//! Only transient, network-class errors are retried; query and constraint
//! errors surface immediately. Each attempt is additionally bounded by the
//! command timeout, and a timed-out attempt counts as transient.

use std::{future::Future, time::Duration};

use sea_orm::DbErr;
use tokio::time::{sleep, timeout};
use tracing::warn;

use carmarket_domain::storage::{StorageError, StorageResult};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; 5 retries = 6 attempts total.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Ceiling on the backoff delay between attempts.
    pub max_delay: Duration,
    /// Upper bound on a single command.
    pub command_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            command_timeout: Duration::from_secs(90),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based): `base * 2^attempt`,
    /// capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.max_delay)
    }
}

pub fn is_transient(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

enum AttemptError {
    Db(DbErr),
    TimedOut,
}

/// Runs `op` under the policy. `op` is re-invoked for every attempt so each
/// retry gets a fresh future.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &'static str,
    mut op: F,
) -> StorageResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt: u32 = 0;
    loop {
        let failure = match timeout(policy.command_timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => AttemptError::Db(err),
            Err(_) => AttemptError::TimedOut,
        };

        let transient = match &failure {
            AttemptError::Db(err) => is_transient(err),
            AttemptError::TimedOut => true,
        };
        if !transient || attempt >= policy.max_retries {
            return Err(match failure {
                AttemptError::Db(err) => StorageError::from_source(err),
                AttemptError::TimedOut => {
                    StorageError::Timeout(policy.command_timeout.as_secs())
                }
            });
        }

        let delay = policy.backoff_delay(attempt);
        attempt += 1;
        let detail = match &failure {
            AttemptError::Db(err) => err.to_string(),
            AttemptError::TimedOut => "command timeout".to_string(),
        };
        warn!(
            op = op_name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %detail,
            "transient database error, retrying"
        );
        sleep(delay).await;
    }
}
