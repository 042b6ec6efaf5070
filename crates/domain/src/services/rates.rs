//! Process-wide exchange-rate cache.
//!
//! A single (value, fetched-at) pair behind an atomic pointer swap. Readers
//! never take a lock and can never observe half of an update; while no fetch
//! has succeeded the cache serves the configured fallback value instead of
//! blocking or failing.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// A successfully fetched rate and when it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedRate {
    pub value: Decimal,
    pub fetched_at: DateTime<Utc>,
}

/// What a reader sees: the cached pair, or the fallback with no timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSnapshot {
    pub value: Decimal,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl RateSnapshot {
    pub fn is_warm(&self) -> bool {
        self.fetched_at.is_some()
    }
}

#[derive(Debug)]
pub struct RateCache {
    slot: ArcSwapOption<CachedRate>,
    fallback: Decimal,
}

impl RateCache {
    pub fn new(fallback: Decimal) -> Self {
        Self {
            slot: ArcSwapOption::const_empty(),
            fallback,
        }
    }

    /// Non-blocking read of the last installed pair, or the fallback.
    pub fn current(&self) -> RateSnapshot {
        match self.slot.load_full() {
            Some(cached) => RateSnapshot {
                value: cached.value,
                fetched_at: Some(cached.fetched_at),
            },
            None => RateSnapshot {
                value: self.fallback,
                fetched_at: None,
            },
        }
    }

    /// Atomically replaces the whole pair. Safe to call concurrently with
    /// any number of readers.
    pub fn update(&self, value: Decimal, fetched_at: DateTime<Utc>) {
        self.slot
            .store(Some(Arc::new(CachedRate { value, fetched_at })));
    }

    pub fn is_warm(&self) -> bool {
        self.slot.load().is_some()
    }
}

/// Errors emitted by a rate source; the warmer logs these, never propagates.
#[derive(Debug, Error)]
pub enum RateFetchError {
    #[error("http error: {0}")]
    Http(String),
    #[error("malformed quote: {0}")]
    Malformed(String),
}

/// External quote source the startup warmer polls once. Behind a trait so
/// tests can inject failing, hanging or canned sources.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rate(&self) -> Result<Decimal, RateFetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::ToPrimitive;

    fn cache() -> RateCache {
        RateCache::new(Decimal::from(520))
    }

    #[test]
    fn cold_cache_serves_fallback_without_timestamp() {
        let cache = cache();
        let snapshot = cache.current();
        assert!(!snapshot.is_warm());
        assert_eq!(snapshot.value, Decimal::from(520));
        assert_eq!(snapshot.fetched_at, None);
        assert!(!cache.is_warm());
    }

    #[test]
    fn update_replaces_whole_pair() {
        let cache = cache();
        let fetched_at = Utc::now();
        cache.update("512.35".parse().unwrap(), fetched_at);

        let snapshot = cache.current();
        assert!(snapshot.is_warm());
        assert_eq!(snapshot.value, "512.35".parse::<Decimal>().unwrap());
        assert_eq!(snapshot.fetched_at, Some(fetched_at));
    }

    /// Writer encodes the iteration number in both halves of the pair; any
    /// torn read would show a value that disagrees with its timestamp.
    #[test]
    fn concurrent_reads_never_observe_torn_pairs() {
        let cache = Arc::new(cache());
        let rounds = 5_000_i64;

        std::thread::scope(|scope| {
            let writer_cache = Arc::clone(&cache);
            scope.spawn(move || {
                for i in 0..rounds {
                    let fetched_at = DateTime::<Utc>::from_timestamp(i, 0).unwrap();
                    writer_cache.update(Decimal::from(i), fetched_at);
                }
            });

            for _ in 0..4 {
                let reader_cache = Arc::clone(&cache);
                scope.spawn(move || {
                    for _ in 0..rounds {
                        let snapshot = reader_cache.current();
                        match snapshot.fetched_at {
                            Some(at) => {
                                assert_eq!(Some(at.timestamp()), snapshot.value.to_i64());
                            }
                            None => assert_eq!(snapshot.value, Decimal::from(520)),
                        }
                    }
                });
            }
        });
    }
}
