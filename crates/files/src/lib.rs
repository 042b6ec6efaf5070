//! File-storage backends behind the domain `FileStore` capability.
//!
//! The backend is chosen exactly once at composition time by
//! [`resolve_file_store`], a pure function of the already-resolved storage
//! settings. Request handling only ever sees the trait object.

mod local;
mod remote;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use carmarket_domain::config::StorageSettings;
use carmarket_domain::storage::{FileResult, FileStore, FileStoreError};

pub use local::LocalFileStore;
pub use remote::RemoteFileStore;

/// Fatal selection errors. The dependent storage capability cannot function
/// at all without a backend, so these abort startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageSelectError {
    #[error("remote storage selected but `{key}` is not configured")]
    MissingRemoteConnection { key: &'static str },
    #[error("invalid remote storage connection string: {0}")]
    InvalidRemoteConnection(String),
}

/// Selects the file backend from configuration. Local selection performs no
/// path existence check; remote selection requires a connection string.
pub fn resolve_file_store(
    settings: &StorageSettings,
) -> Result<Arc<dyn FileStore>, StorageSelectError> {
    if settings.use_remote() {
        let connection = settings.remote_connection().ok_or(
            StorageSelectError::MissingRemoteConnection {
                key: "REMOTE_STORAGE_URL",
            },
        )?;
        let store = RemoteFileStore::from_connection_string(connection)?;
        info!(backend = "remote", endpoint = store.endpoint(), "file storage selected");
        Ok(Arc::new(store))
    } else {
        info!(backend = "local", path = settings.local_path(), "file storage selected");
        Ok(Arc::new(LocalFileStore::new(settings.local_path())))
    }
}

/// Object keys may contain `/` separators but never traversal or absolute
/// segments; both backends share this check.
pub(crate) fn validate_key(key: &str) -> FileResult<()> {
    let valid = !key.is_empty()
        && key.len() <= 512
        && !key.starts_with('/')
        && !key.contains('\\')
        && !key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..")
        && key.chars().all(|c| !c.is_control());
    if valid {
        Ok(())
    } else {
        Err(FileStoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_backend_selected_regardless_of_remote_credential() {
        let settings = StorageSettings::new(
            false,
            "photos",
            Some("endpoint=https://blobs.example.com;key=secret".into()),
        );
        assert!(resolve_file_store(&settings).is_ok());
    }

    #[test]
    fn remote_backend_requires_connection_string() {
        let settings = StorageSettings::new(true, "LocalStorage", None);
        let err = resolve_file_store(&settings).unwrap_err();
        assert_eq!(
            err,
            StorageSelectError::MissingRemoteConnection {
                key: "REMOTE_STORAGE_URL"
            }
        );
        assert!(err.to_string().contains("REMOTE_STORAGE_URL"));
    }

    #[test]
    fn remote_backend_selected_with_credential() {
        let settings = StorageSettings::new(
            true,
            "LocalStorage",
            Some("endpoint=https://blobs.example.com/cars;key=secret".into()),
        );
        assert!(resolve_file_store(&settings).is_ok());
    }

    #[test]
    fn key_validation_rejects_traversal_and_absolutes() {
        assert!(validate_key("listings/42/front.jpg").is_ok());
        assert!(validate_key("a.txt").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("../secrets").is_err());
        assert!(validate_key("photos/../../x").is_err());
        assert!(validate_key("dir/./x").is_err());
        assert!(validate_key("win\\style").is_err());
        assert!(validate_key(&"k".repeat(513)).is_err());
    }
}
