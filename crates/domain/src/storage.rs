//! Capability traits implemented by the infrastructure crates.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{AccountRecord, EmailAddress, NewAccount};

/// Common result alias for relational storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("database operation timed out after {0} seconds")]
    Timeout(u64),
}

impl StorageError {
    pub fn from_source(err: impl std::fmt::Display) -> Self {
        Self::Database(err.to_string())
    }
}

/// Whether a conflict-tolerant insert actually wrote a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account(&self, email: &EmailAddress) -> StorageResult<Option<AccountRecord>>;

    /// Inserts the account unless one with the same email already exists.
    /// Losing a concurrent race reports `AlreadyExists`, never an error.
    async fn create_account(&self, account: NewAccount) -> StorageResult<CreateOutcome>;

    async fn count_accounts(&self) -> StorageResult<u64>;
}

/// Common result alias for file-backend operations.
pub type FileResult<T> = Result<T, FileStoreError>;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("invalid object key `{0}`")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote backend error: {0}")]
    Remote(String),
}

/// Uniform storage capability over user-visible objects (listing photos,
/// documents). Selected once at composition time; see the files crate.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug {
    async fn store(&self, key: &str, contents: &[u8]) -> FileResult<()>;
    async fn retrieve(&self, key: &str) -> FileResult<Option<Vec<u8>>>;
    async fn delete(&self, key: &str) -> FileResult<()>;
}
