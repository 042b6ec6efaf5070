//! Bootstrap admin-account seeding.
//!
//! Runs at every startup, concurrent with request serving. The routine is
//! convergent rather than atomic: the existence check is only a fast path,
//! and the unique email column makes the insert itself settle any race
//! between concurrently starting instances.

use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use carmarket_domain::config::AppConfig;
use carmarket_domain::model::{EmailAddress, EmailFormatError, NewAccount};
use carmarket_domain::services::auth::{hash_password, CredentialError};
use carmarket_domain::storage::{AccountStore, CreateOutcome, StorageError};

/// Well-known bootstrap identity. The password is expected to be rotated
/// operationally after the first deployment; it is not a security boundary.
pub const ADMIN_EMAIL: &str = "admin@gmail.com";
pub const ADMIN_DISPLAY_NAME: &str = "Administrator";
pub const ADMIN_PHONE: &str = "0000-0000";
pub const DEFAULT_ADMIN_PASSWORD: &str = "ChangeMe!2024";

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub display_name: String,
    pub phone: String,
    pub password: String,
}

impl AdminSeed {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            email: ADMIN_EMAIL.to_string(),
            display_name: ADMIN_DISPLAY_NAME.to_string(),
            phone: ADMIN_PHONE.to_string(),
            password: config
                .admin_seed_password()
                .unwrap_or(DEFAULT_ADMIN_PASSWORD)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid seed email: {0}")]
    Email(#[from] EmailFormatError),
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Check-then-create, converging to at most one account with the seed email.
/// Losing a concurrent insert race reports `AlreadyPresent`, never an error.
pub async fn ensure_admin_account<S>(store: &S, seed: &AdminSeed) -> Result<SeedOutcome, SeedError>
where
    S: AccountStore + ?Sized,
{
    let email = EmailAddress::parse(&seed.email)?;

    if store.find_account(&email).await?.is_some() {
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let password_hash = hash_password(&seed.password)?;
    let outcome = store
        .create_account(NewAccount {
            email,
            display_name: seed.display_name.clone(),
            phone: Some(seed.phone.clone()),
            password_hash,
            is_admin: true,
        })
        .await?;

    Ok(match outcome {
        CreateOutcome::Created => SeedOutcome::Created,
        CreateOutcome::AlreadyExists => SeedOutcome::AlreadyPresent,
    })
}

/// Task-boundary wrapper: any failure is logged and swallowed so seeding can
/// never block or crash startup.
pub async fn run_admin_seeder<S: AccountStore>(store: &S, seed: AdminSeed) {
    match ensure_admin_account(store, &seed).await {
        Ok(SeedOutcome::Created) => {
            counter!("admin_seed_runs_total", "result" => "created").increment(1);
            info!(email = %seed.email, "bootstrap admin account created");
        }
        Ok(SeedOutcome::AlreadyPresent) => {
            counter!("admin_seed_runs_total", "result" => "present").increment(1);
            info!(email = %seed.email, "bootstrap admin account already present");
        }
        Err(err) => {
            counter!("admin_seed_runs_total", "result" => "error").increment(1);
            warn!(%err, "admin account seeding failed");
        }
    }
}
