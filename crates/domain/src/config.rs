//! Environment-driven configuration structures shared by all binaries.
//!
//! Everything is resolved into an immutable [`AppConfig`] snapshot exactly
//! once at startup; nothing re-reads the environment afterwards.

use std::{env, time::Duration};

use rust_decimal::Decimal;
use thiserror::Error;

/// Default public listener when `BIND_ADDRESS` is not set.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
/// Default root for the local file backend.
pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "LocalStorage";
/// Public CRC/USD reference-rate endpoint used when `RATE_SOURCE_URL` is unset.
pub const DEFAULT_RATE_SOURCE_URL: &str = "https://api.hacienda.go.cr/indicadores/tc/dolar";
/// Upper bound on the startup rate fetch.
pub const DEFAULT_RATE_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
/// Rate served while the cache is cold and no fetch has succeeded yet.
pub const DEFAULT_RATE_FALLBACK: &str = "520";

/// Deployment environment. Controls diagnostic verbosity and cookie security;
/// the production behavior is the default so a missing variable can never
/// enable development diagnostics on a live deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Full configuration snapshot for the marketplace binary.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    database_url: String,
    bind_address: String,
    unix_socket: Option<String>,
    environment: Environment,
    enforce_tls: bool,
    storage: StorageSettings,
    rates: RateSettings,
    onvo_pay: OnvoPaySettings,
    admin_seed_password: Option<String>,
}

impl AppConfig {
    /// Loads configuration by hydrating `.env` (if present) and reading the
    /// process variables. Missing or malformed entries surface as
    /// `ConfigError` so the binary can abort before binding.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            database_url: get_required_var("DATABASE_URL")?,
            bind_address: get_optional_var("BIND_ADDRESS")
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            unix_socket: get_optional_var("UNIX_SOCKET"),
            environment: get_environment()?,
            enforce_tls: get_bool_var("ENFORCE_TLS", false)?,
            storage: StorageSettings::load_from_env()?,
            rates: RateSettings::load_from_env()?,
            onvo_pay: OnvoPaySettings::load_from_env(),
            admin_seed_password: get_optional_var("ADMIN_SEED_PASSWORD"),
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn unix_socket(&self) -> Option<&str> {
        self.unix_socket.as_deref()
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn enforce_tls(&self) -> bool {
        self.enforce_tls
    }

    pub fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub fn rates(&self) -> &RateSettings {
        &self.rates
    }

    pub fn onvo_pay(&self) -> &OnvoPaySettings {
        &self.onvo_pay
    }

    pub fn admin_seed_password(&self) -> Option<&str> {
        self.admin_seed_password.as_deref()
    }
}

/// File-backend selection knobs. The remote connection string falls back to
/// `REMOTE_STORAGE_CONNECTION` only when `REMOTE_STORAGE_URL` is empty, so the
/// selector itself stays a pure function of this snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    use_remote: bool,
    local_path: String,
    remote_connection: Option<String>,
}

impl StorageSettings {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let remote_connection =
            get_optional_var("REMOTE_STORAGE_URL").or_else(|| get_optional_var("REMOTE_STORAGE_CONNECTION"));

        Ok(Self {
            use_remote: get_bool_var("USE_REMOTE_STORAGE", false)?,
            local_path: get_optional_var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
            remote_connection,
        })
    }

    pub fn new(use_remote: bool, local_path: impl Into<String>, remote_connection: Option<String>) -> Self {
        Self {
            use_remote,
            local_path: local_path.into(),
            remote_connection,
        }
    }

    pub fn use_remote(&self) -> bool {
        self.use_remote
    }

    pub fn local_path(&self) -> &str {
        &self.local_path
    }

    pub fn remote_connection(&self) -> Option<&str> {
        self.remote_connection.as_deref()
    }
}

/// Exchange-rate warm-up knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSettings {
    source_url: String,
    fetch_timeout: Duration,
    fallback: Decimal,
}

impl RateSettings {
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let fetch_timeout = match get_optional_var("RATE_FETCH_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|source| ConfigError::InvalidNumber {
                    key: "RATE_FETCH_TIMEOUT_SECS",
                    source,
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_RATE_FETCH_TIMEOUT,
        };

        let fallback_raw =
            get_optional_var("RATE_FALLBACK").unwrap_or_else(|| DEFAULT_RATE_FALLBACK.to_string());
        let fallback = fallback_raw
            .parse::<Decimal>()
            .map_err(|_| ConfigError::InvalidDecimal {
                key: "RATE_FALLBACK",
                value: fallback_raw,
            })?;

        Ok(Self {
            source_url: get_optional_var("RATE_SOURCE_URL")
                .unwrap_or_else(|| DEFAULT_RATE_SOURCE_URL.to_string()),
            fetch_timeout,
            fallback,
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn fallback(&self) -> Decimal {
        self.fallback
    }
}

/// Payment-provider section, carried opaquely for the payment collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnvoPaySettings {
    api_url: Option<String>,
    secret_key: Option<String>,
    account_id: Option<String>,
}

impl OnvoPaySettings {
    pub fn load_from_env() -> Self {
        Self {
            api_url: get_optional_var("ONVO_PAY_API_URL"),
            secret_key: get_optional_var("ONVO_PAY_SECRET_KEY"),
            account_id: get_optional_var("ONVO_PAY_ACCOUNT_ID"),
        }
    }

    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }
}

fn get_environment() -> Result<Environment, ConfigError> {
    match get_optional_var("APP_ENV") {
        None => Ok(Environment::Production),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment { value }),
        },
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(ConfigError::MissingVar { key })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(_) => Err(ConfigError::MissingVar { key }),
    }
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn get_bool_var(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match get_optional_var(key) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { key, value }),
        },
    }
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("CARMARKET_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid boolean in `{key}`: `{value}`")]
    InvalidBool { key: &'static str, value: String },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("invalid decimal in `{key}`: `{value}`")]
    InvalidDecimal { key: &'static str, value: String },
    #[error("invalid APP_ENV value `{value}`, expected `development` or `production`")]
    InvalidEnvironment { value: String },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn set_env() {
        env::set_var("CARMARKET_SKIP_DOTENV", "1");
        env::set_var("DATABASE_URL", "sqlite://test.db");
        env::remove_var("BIND_ADDRESS");
        env::remove_var("UNIX_SOCKET");
        env::remove_var("APP_ENV");
        env::remove_var("ENFORCE_TLS");
        env::remove_var("USE_REMOTE_STORAGE");
        env::remove_var("LOCAL_STORAGE_PATH");
        env::remove_var("REMOTE_STORAGE_URL");
        env::remove_var("REMOTE_STORAGE_CONNECTION");
        env::remove_var("RATE_SOURCE_URL");
        env::remove_var("RATE_FETCH_TIMEOUT_SECS");
        env::remove_var("RATE_FALLBACK");
        env::remove_var("ADMIN_SEED_PASSWORD");
        env::remove_var("ONVO_PAY_API_URL");
        env::remove_var("ONVO_PAY_SECRET_KEY");
        env::remove_var("ONVO_PAY_ACCOUNT_ID");
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let _guard = ENV_GUARD.lock().unwrap();
        set_env();

        let config = AppConfig::load_from_env().expect("config loads");
        assert_eq!(config.database_url(), "sqlite://test.db");
        assert_eq!(config.bind_address(), DEFAULT_BIND_ADDRESS);
        assert_eq!(config.environment(), Environment::Production);
        assert!(!config.enforce_tls());
        assert!(!config.storage().use_remote());
        assert_eq!(config.storage().local_path(), DEFAULT_LOCAL_STORAGE_PATH);
        assert_eq!(config.rates().fetch_timeout(), DEFAULT_RATE_FETCH_TIMEOUT);
        assert_eq!(config.rates().fallback(), DEFAULT_RATE_FALLBACK.parse().unwrap());
        assert!(!config.onvo_pay().is_configured());
    }

    #[test]
    fn missing_database_url_is_fatal() {
        let _guard = ENV_GUARD.lock().unwrap();
        set_env();
        env::remove_var("DATABASE_URL");

        let err = AppConfig::load_from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar {
                key: "DATABASE_URL"
            }
        ));

        set_env();
    }

    #[test]
    fn blank_database_url_is_treated_as_missing() {
        let _guard = ENV_GUARD.lock().unwrap();
        set_env();
        env::set_var("DATABASE_URL", "   ");

        let err = AppConfig::load_from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVar {
                key: "DATABASE_URL"
            }
        ));

        set_env();
    }

    #[test]
    fn remote_connection_prefers_config_key_over_fallback() {
        let _guard = ENV_GUARD.lock().unwrap();
        set_env();
        env::set_var("REMOTE_STORAGE_URL", "endpoint=https://primary;key=a");
        env::set_var("REMOTE_STORAGE_CONNECTION", "endpoint=https://fallback;key=b");

        let settings = StorageSettings::load_from_env().expect("settings load");
        assert_eq!(
            settings.remote_connection(),
            Some("endpoint=https://primary;key=a")
        );

        set_env();
    }

    #[test]
    fn remote_connection_fallback_used_only_when_primary_empty() {
        let _guard = ENV_GUARD.lock().unwrap();
        set_env();
        env::set_var("REMOTE_STORAGE_URL", "  ");
        env::set_var("REMOTE_STORAGE_CONNECTION", "endpoint=https://fallback;key=b");

        let settings = StorageSettings::load_from_env().expect("settings load");
        assert_eq!(
            settings.remote_connection(),
            Some("endpoint=https://fallback;key=b")
        );

        set_env();
    }

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        let _guard = ENV_GUARD.lock().unwrap();
        set_env();

        for value in ["1", "true", "YES", "On"] {
            env::set_var("USE_REMOTE_STORAGE", value);
            assert!(StorageSettings::load_from_env().unwrap().use_remote());
        }
        for value in ["0", "false", "NO", "Off"] {
            env::set_var("USE_REMOTE_STORAGE", value);
            assert!(!StorageSettings::load_from_env().unwrap().use_remote());
        }

        env::set_var("USE_REMOTE_STORAGE", "definitely");
        let err = StorageSettings::load_from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidBool {
                key: "USE_REMOTE_STORAGE",
                ..
            }
        ));

        set_env();
    }

    #[test]
    fn environment_parses_and_rejects_unknown_values() {
        let _guard = ENV_GUARD.lock().unwrap();
        set_env();

        env::set_var("APP_ENV", "development");
        assert!(AppConfig::load_from_env().unwrap().environment().is_development());

        env::set_var("APP_ENV", "PROD");
        assert_eq!(
            AppConfig::load_from_env().unwrap().environment(),
            Environment::Production
        );

        env::set_var("APP_ENV", "staging");
        assert!(matches!(
            AppConfig::load_from_env().unwrap_err(),
            ConfigError::InvalidEnvironment { .. }
        ));

        set_env();
    }

    #[test]
    fn rate_settings_parse_overrides() {
        let _guard = ENV_GUARD.lock().unwrap();
        set_env();
        env::set_var("RATE_SOURCE_URL", "http://localhost:9/quote");
        env::set_var("RATE_FETCH_TIMEOUT_SECS", "2");
        env::set_var("RATE_FALLBACK", "507.25");

        let rates = RateSettings::load_from_env().expect("rates load");
        assert_eq!(rates.source_url(), "http://localhost:9/quote");
        assert_eq!(rates.fetch_timeout(), Duration::from_secs(2));
        assert_eq!(rates.fallback(), "507.25".parse().unwrap());

        env::set_var("RATE_FALLBACK", "not-a-rate");
        assert!(matches!(
            RateSettings::load_from_env().unwrap_err(),
            ConfigError::InvalidDecimal {
                key: "RATE_FALLBACK",
                ..
            }
        ));

        set_env();
    }

    #[test]
    fn onvo_pay_section_is_optional_and_opaque() {
        let _guard = ENV_GUARD.lock().unwrap();
        set_env();
        env::set_var("ONVO_PAY_SECRET_KEY", "onvo_test_secret");
        env::set_var("ONVO_PAY_ACCOUNT_ID", "acct_1");

        let config = AppConfig::load_from_env().expect("config loads");
        assert!(config.onvo_pay().is_configured());
        assert_eq!(config.onvo_pay().account_id(), Some("acct_1"));
        assert_eq!(config.onvo_pay().api_url(), None);

        set_env();
    }
}
