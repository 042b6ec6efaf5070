//! Supervised fire-and-forget startup tasks.
//!
//! Both tasks race the server's readiness: requests may arrive before either
//! finishes. Failures are logged at the task boundary and never reach the
//! host process; the shutdown channel cancels anything still in flight.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use carmarket_domain::services::rates::{RateCache, RateSource};

/// Runs `task` until completion or until the shutdown channel fires,
/// whichever comes first. Panics stay inside the spawned task.
pub fn spawn_supervised<F>(
    name: &'static str,
    mut shutdown: watch::Receiver<bool>,
    task: F,
) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = task => {}
            _ = shutdown.changed() => {
                debug!(task = name, "cancelled at shutdown");
            }
        }
    })
}

/// Single startup attempt to warm the exchange-rate cache. On failure or
/// timeout the cache keeps serving its fallback.
pub async fn warm_rate_cache(
    cache: Arc<RateCache>,
    source: impl RateSource,
    fetch_timeout: Duration,
) {
    match tokio::time::timeout(fetch_timeout, source.fetch_rate()).await {
        Ok(Ok(rate)) => {
            cache.update(rate, Utc::now());
            counter!("rate_warm_attempts_total", "result" => "ok").increment(1);
            info!(%rate, "exchange rate cache warmed");
        }
        Ok(Err(err)) => {
            counter!("rate_warm_attempts_total", "result" => "error").increment(1);
            warn!(%err, "exchange rate warm-up failed, serving fallback");
        }
        Err(_) => {
            counter!("rate_warm_attempts_total", "result" => "timeout").increment(1);
            warn!(
                timeout_secs = fetch_timeout.as_secs(),
                "exchange rate warm-up timed out, serving fallback"
            );
        }
    }
}
