pub mod admin;
pub mod auth;
pub mod files;
pub mod metrics;
pub mod rates;

pub use admin::admin_overview_handler;
pub use auth::{login_handler, logout_handler};
pub use files::{delete_file_handler, serve_file_handler, store_file_handler};
pub use rates::exchange_rate_handler;
pub use self::metrics::metrics_handler;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use carmarket_domain::model::EmailFormatError;
use carmarket_domain::storage::{FileStoreError, StorageError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid email address: {0}")]
    InvalidEmail(#[from] EmailFormatError),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("authentication required")]
    NotAuthenticated,
    #[error("access denied")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
    #[error("file storage failure: {0}")]
    Files(#[from] FileStoreError),
}

impl ApiError {
    /// Backend failure detail stays in the logs; clients get a fixed message.
    fn public_message(&self) -> String {
        match self {
            ApiError::Storage(_)
            | ApiError::Files(FileStoreError::Io(_) | FileStoreError::Remote(_)) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Files(FileStoreError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) | ApiError::Files(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.public_message(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
