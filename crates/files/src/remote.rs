use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};

use carmarket_domain::storage::{FileResult, FileStore, FileStoreError};

use crate::{validate_key, StorageSelectError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Blob store speaking plain PUT/GET/DELETE against a remote endpoint.
///
/// Connection strings follow the `endpoint=<url>;key=<secret>` form; the key
/// is optional and sent as a bearer credential when present.
#[derive(Debug)]
pub struct RemoteFileStore {
    client: Client,
    endpoint: String,
    access_key: Option<String>,
}

impl RemoteFileStore {
    pub fn from_connection_string(connection: &str) -> Result<Self, StorageSelectError> {
        let mut endpoint = None;
        let mut access_key = None;

        for pair in connection.split(';').filter(|p| !p.trim().is_empty()) {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                StorageSelectError::InvalidRemoteConnection(format!(
                    "expected `name=value`, got `{}`",
                    pair.trim()
                ))
            })?;
            match name.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.trim().to_string()),
                "key" => access_key = Some(value.trim().to_string()),
                other => {
                    return Err(StorageSelectError::InvalidRemoteConnection(format!(
                        "unknown field `{other}`"
                    )))
                }
            }
        }

        let endpoint = endpoint
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                StorageSelectError::InvalidRemoteConnection("missing `endpoint`".into())
            })?;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(StorageSelectError::InvalidRemoteConnection(format!(
                "endpoint must be http(s), got `{endpoint}`"
            )));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| StorageSelectError::InvalidRemoteConnection(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_key: access_key.filter(|value| !value.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint, key)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl FileStore for RemoteFileStore {
    async fn store(&self, key: &str, contents: &[u8]) -> FileResult<()> {
        validate_key(key)?;
        let response = self
            .authorize(self.client.put(self.object_url(key)).body(contents.to_vec()))
            .send()
            .await
            .map_err(remote_error)?;
        expect_success(key, response.status())
    }

    async fn retrieve(&self, key: &str) -> FileResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let response = self
            .authorize(self.client.get(self.object_url(key)))
            .send()
            .await
            .map_err(remote_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        expect_success(key, response.status())?;
        let bytes = response.bytes().await.map_err(remote_error)?;
        Ok(Some(bytes.to_vec()))
    }

    async fn delete(&self, key: &str) -> FileResult<()> {
        validate_key(key)?;
        let response = self
            .authorize(self.client.delete(self.object_url(key)))
            .send()
            .await
            .map_err(remote_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        expect_success(key, response.status())
    }
}

fn remote_error(err: reqwest::Error) -> FileStoreError {
    FileStoreError::Remote(err.to_string())
}

fn expect_success(key: &str, status: StatusCode) -> FileResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(FileStoreError::Remote(format!(
            "unexpected status {status} for `{key}`"
        )))
    }
}
