use actix_web::{web, HttpRequest, HttpResponse};
use metrics::counter;
use serde::{Deserialize, Serialize};

use carmarket_domain::model::EmailAddress;
use carmarket_domain::services::auth::verify_password;
use carmarket_domain::services::sessions::{AuthSession, AUTH_COOKIE, SESSION_COOKIE};
use carmarket_domain::storage::AccountStore;

use crate::pipeline::{auth_cookie, removal_cookie, session_cookie};
use crate::state::AppState;

use super::ApiError;

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub status: String,
    pub display_name: String,
    pub is_admin: bool,
}

pub async fn login_handler(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let email = EmailAddress::parse(&payload.email).inspect_err(|_| {
        counter!("api_login_total", "status" => "invalid_email").increment(1);
    })?;

    let Some(account) = state.storage().find_account(&email).await? else {
        counter!("api_login_total", "status" => "unknown_account").increment(1);
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&account.password_hash, &payload.password) {
        counter!("api_login_total", "status" => "bad_password").increment(1);
        return Err(ApiError::InvalidCredentials);
    }

    let identity = AuthSession {
        email: account.email.clone(),
        display_name: account.display_name.clone(),
        is_admin: account.is_admin,
    };
    let session_token = state.sessions().open_session(identity.clone());
    let remember_token = state.sessions().issue_remember_token(identity);
    counter!("api_login_total", "status" => "success").increment(1);

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&session_token, state.environment()))
        .cookie(auth_cookie(&remember_token, state.environment()))
        .json(LoginResponse {
            status: "ok".to_string(),
            display_name: account.display_name,
            is_admin: account.is_admin,
        }))
}

pub async fn logout_handler(state: web::Data<AppState>, request: HttpRequest) -> HttpResponse {
    if let Some(cookie) = request.cookie(SESSION_COOKIE) {
        state.sessions().revoke_session(cookie.value());
    }
    if let Some(cookie) = request.cookie(AUTH_COOKIE) {
        state.sessions().revoke_remember_token(cookie.value());
    }

    HttpResponse::Ok()
        .cookie(removal_cookie(SESSION_COOKIE))
        .cookie(removal_cookie(AUTH_COOKIE))
        .json(serde_json::json!({ "status": "logged_out" }))
}
