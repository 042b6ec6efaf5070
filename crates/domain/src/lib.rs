//! Domain-level building blocks shared across the marketplace crates.
//!
//! Holds the immutable configuration snapshot, account and exchange-rate
//! models, process-wide services (rate cache, sessions, credentials,
//! telemetry) and the capability traits the infrastructure crates implement.

pub mod config;
pub mod model;
pub mod services;
pub mod storage;

pub use model::*;
pub use storage::*;
