use std::sync::Arc;

#[cfg(unix)]
use std::{fs, path::Path};

use actix_web::{
    middleware::{from_fn, Logger},
    web, App, HttpServer,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use carmarket_domain::config::{AppConfig, ConfigError};
use carmarket_domain::services::{
    rates::RateCache,
    sessions::SessionService,
    telemetry::{init_telemetry, TelemetryConfig, TelemetryError},
};
use carmarket_domain::storage::StorageError;
use carmarket_files::{resolve_file_store, StorageSelectError};
use carmarket_storage::MarketStorage;

use crate::{
    handlers::{
        admin_overview_handler, delete_file_handler, exchange_rate_handler, login_handler,
        logout_handler, metrics_handler, serve_file_handler, store_file_handler,
    },
    pipeline,
    rates::HttpRateSource,
    seed::{self, AdminSeed},
    state::AppState,
    tasks,
};

/// Composition root. Construction is strictly ordered: configuration, then
/// telemetry, then persistence and the file backend, then the shared state
/// and pipeline. The two startup tasks are spawned fire-and-forget; the
/// server starts accepting connections without waiting for either.
pub async fn run() -> Result<(), BootstrapError> {
    // 1. configuration snapshot, resolved once
    let config = AppConfig::load_from_env()?;

    // 2. telemetry
    let telemetry_config = TelemetryConfig::from_env("WEB");
    let telemetry = init_telemetry(&telemetry_config)?;

    // 3. persistence, with bounded retry and dev-only statement logging
    let storage = MarketStorage::builder()
        .database_url(config.database_url())
        .verbose_logging(config.environment().is_development())
        .build()
        .await?;

    // 4. file backend, fixed for the process lifetime
    let files = resolve_file_store(config.storage())?;

    // 5. process singletons
    let rates = Arc::new(RateCache::new(config.rates().fallback()));
    let sessions = Arc::new(SessionService::new());
    let state = AppState::new(
        storage.clone(),
        files,
        Arc::clone(&rates),
        Arc::clone(&sessions),
        telemetry.clone(),
        config.environment(),
        config.enforce_tls(),
    );

    if config.onvo_pay().is_configured() {
        info!("payment provider configured");
    } else {
        info!("payment provider not configured, checkout stays disabled");
    }

    // 6. background tasks race server readiness; startup never waits on them
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tasks::spawn_supervised(
        "rate_warmer",
        shutdown_rx.clone(),
        tasks::warm_rate_cache(
            Arc::clone(&rates),
            HttpRateSource::new(config.rates().source_url()),
            config.rates().fetch_timeout(),
        ),
    );
    let seeder_storage = storage.clone();
    let admin_seed = AdminSeed::from_config(&config);
    tasks::spawn_supervised("admin_seeder", shutdown_rx, async move {
        seed::run_admin_seeder(&seeder_storage, admin_seed).await;
    });

    // 7. pipeline + routes; wrap() layers execute last-registered-first, so
    //    the TLS redirect is outermost, then content-type normalization,
    //    then the public short-circuit routes, then authn -> authz around
    //    dispatch, with session refresh applied on the response path.
    let app_state = state.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(Logger::default())
            .wrap(from_fn(pipeline::normalize_content_type))
            .wrap(from_fn(pipeline::redirect_to_https))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/files/{key:.*}", web::get().to(serve_file_handler))
            .service(
                web::scope("/api/v1")
                    .wrap(from_fn(pipeline::attach_session))
                    .wrap(from_fn(pipeline::authenticate))
                    .route("/login", web::post().to(login_handler))
                    .route("/logout", web::post().to(logout_handler))
                    .route("/exchange-rate", web::get().to(exchange_rate_handler))
                    .service(
                        web::scope("/admin")
                            .wrap(from_fn(pipeline::require_admin))
                            .route("/overview", web::get().to(admin_overview_handler))
                            .route("/files/{key:.*}", web::post().to(store_file_handler))
                            .route("/files/{key:.*}", web::delete().to(delete_file_handler)),
                    ),
            )
    });

    #[cfg(unix)]
    {
        if let Some(socket) = config.unix_socket() {
            cleanup_socket(socket)?;
            server = server.bind_uds(socket)?;
        } else {
            server = server.bind(config.bind_address())?;
        }
    }

    #[cfg(not(unix))]
    {
        if let Some(socket) = config.unix_socket() {
            return Err(BootstrapError::Io(std::io::Error::other(format!(
                "unix socket '{socket}' requested but this platform does not support it"
            ))));
        }
        server = server.bind(config.bind_address())?;
    }

    let result = server.run().await;

    // 8. the server is done; cancel whatever background work is still in flight
    let _ = shutdown_tx.send(true);
    result?;

    Ok(())
}

/// Failures during startup orchestration. Config and storage-selection
/// errors abort the process before the listener binds.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("file storage error: {0}")]
    FileStorage(#[from] StorageSelectError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// A stale socket file from an unclean exit would make bind_uds fail.
#[cfg(unix)]
fn cleanup_socket(path: &str) -> std::io::Result<()> {
    let socket_path = Path::new(path);
    if socket_path.exists() {
        fs::remove_file(socket_path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #[cfg(unix)]
    #[actix_web::test]
    async fn cleanup_socket_removes_stale_file() {
        use super::cleanup_socket;

        let path = std::env::temp_dir().join(format!(
            "carmarket-test-{}-{}.sock",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::write(&path, b"stub").expect("write socket file");
        cleanup_socket(path.to_str().unwrap()).expect("cleanup succeeds");
        assert!(!path.exists());
    }
}
