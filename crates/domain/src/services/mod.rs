//! Shared service helpers: credentials, rate caching, sessions and telemetry.

pub mod auth;
pub mod rates;
pub mod sessions;
pub mod telemetry;

pub use auth::*;
pub use rates::*;
pub use sessions::*;
pub use telemetry::*;
