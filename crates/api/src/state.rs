use std::sync::Arc;

use carmarket_domain::config::Environment;
use carmarket_domain::services::{
    rates::RateCache, sessions::SessionService, telemetry::TelemetryGuard,
};
use carmarket_domain::storage::FileStore;
use carmarket_storage::MarketStorage;

/// Process-wide singletons shared by every worker.
///
/// Only process-lifetime state lives here; per-request state (the
/// authenticated user) exists solely in request extensions via the
/// `CurrentUser` extractor, so a singleton cannot capture it.
#[derive(Clone)]
pub struct AppState {
    storage: MarketStorage,
    files: Arc<dyn FileStore>,
    rates: Arc<RateCache>,
    sessions: Arc<SessionService>,
    telemetry: TelemetryGuard,
    environment: Environment,
    enforce_tls: bool,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        storage: MarketStorage,
        files: Arc<dyn FileStore>,
        rates: Arc<RateCache>,
        sessions: Arc<SessionService>,
        telemetry: TelemetryGuard,
        environment: Environment,
        enforce_tls: bool,
    ) -> Self {
        Self {
            storage,
            files,
            rates,
            sessions,
            telemetry,
            environment,
            enforce_tls,
        }
    }

    pub fn storage(&self) -> &MarketStorage {
        &self.storage
    }

    pub fn files(&self) -> &dyn FileStore {
        self.files.as_ref()
    }

    pub fn rates(&self) -> &RateCache {
        self.rates.as_ref()
    }

    pub fn sessions(&self) -> &SessionService {
        self.sessions.as_ref()
    }

    pub fn telemetry(&self) -> &TelemetryGuard {
        &self.telemetry
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn enforce_tls(&self) -> bool {
        self.enforce_tls
    }
}
