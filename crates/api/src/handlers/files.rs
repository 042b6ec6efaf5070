use actix_web::{web, HttpResponse};

use crate::pipeline::CurrentUser;
use crate::state::AppState;

use super::ApiError;

pub async fn serve_file_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    match state.files().retrieve(&key).await? {
        Some(bytes) => Ok(HttpResponse::Ok()
            .content_type("application/octet-stream")
            .body(bytes)),
        None => Err(ApiError::NotFound),
    }
}

pub async fn store_file_handler(
    _user: CurrentUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    state.files().store(&path.into_inner(), body.as_ref()).await?;
    Ok(HttpResponse::Created().finish())
}

pub async fn delete_file_handler(
    _user: CurrentUser,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state.files().delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
