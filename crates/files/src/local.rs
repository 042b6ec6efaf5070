use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use carmarket_domain::storage::{FileResult, FileStore};

use crate::validate_key;

/// Filesystem-backed store rooted at a configured directory. The root is not
/// required to exist at construction; directories are created on first write.
#[derive(Debug)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> FileResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, key: &str, contents: &[u8]) -> FileResult<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, contents).await?;
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> FileResult<Option<Vec<u8>>> {
        let path = self.object_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, key: &str) -> FileResult<()> {
        let path = self.object_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carmarket_domain::storage::FileStoreError;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!(
            "carmarket-files-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::SystemTime::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[tokio::test]
    async fn store_creates_directories_and_roundtrips() {
        let root = scratch_root();
        let store = LocalFileStore::new(&root);

        store
            .store("listings/7/front.jpg", b"jpeg-bytes")
            .await
            .expect("store succeeds");
        let bytes = store
            .retrieve("listings/7/front.jpg")
            .await
            .expect("retrieve succeeds");
        assert_eq!(bytes.as_deref(), Some(&b"jpeg-bytes"[..]));

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn retrieve_missing_returns_none_and_delete_is_idempotent() {
        let root = scratch_root();
        let store = LocalFileStore::new(&root);

        assert_eq!(store.retrieve("nope.bin").await.unwrap(), None);
        store.delete("nope.bin").await.expect("delete of missing is ok");

        store.store("doc.pdf", b"x").await.unwrap();
        store.delete("doc.pdf").await.unwrap();
        assert_eq!(store.retrieve("doc.pdf").await.unwrap(), None);

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let store = LocalFileStore::new(scratch_root());
        let err = store.retrieve("../outside").await.unwrap_err();
        assert!(matches!(err, FileStoreError::InvalidKey(_)));
    }
}
