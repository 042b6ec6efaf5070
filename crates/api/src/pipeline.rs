//! Cross-cutting middleware and the per-request identity extractor.
//!
//! Execution order across the assembled app: transport-security redirect,
//! content-type normalization, the public short-circuit routes (`/files`,
//! `/metrics`), then per-scope authentication, authorization and session
//! attachment around dispatch. Authentication always runs before
//! authorization; reversing them would let unauthenticated requests reach
//! gated routes. actix applies `wrap` layers last-registered-first, so the
//! assembler registers them in reverse.

use std::future::{ready, Ready};

use actix_web::{
    body::{EitherBody, MessageBody},
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::header::{HeaderValue, CONTENT_TYPE, LOCATION},
    middleware::Next,
    web, Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use tracing::warn;

use carmarket_domain::config::Environment;
use carmarket_domain::services::sessions::{AuthSession, AUTH_COOKIE, SESSION_COOKIE};

use crate::handlers::ApiError;
use crate::state::AppState;

/// Identity of the caller, attached by [`authenticate`]. Lives only in the
/// request extensions; handlers receive it as an extractor.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthSession);

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or(ApiError::NotAuthenticated),
        )
    }
}

/// Redirects plain-text requests to `https://` when TLS enforcement is on.
pub async fn redirect_to_https(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    let enforce = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.enforce_tls())
        .unwrap_or(false);

    if enforce {
        let (scheme, host) = {
            let info = req.connection_info();
            (info.scheme().to_string(), info.host().to_string())
        };
        if scheme != "https" {
            let location = format!("https://{host}{}", req.uri());
            let response = HttpResponse::PermanentRedirect()
                .insert_header((LOCATION, location))
                .finish();
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Ensures `text/*` responses always declare a UTF-8 charset.
pub async fn normalize_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let mut res = next.call(req).await?;

    let headers = res.response_mut().headers_mut();
    let normalized = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .filter(|value| value.starts_with("text/") && !value.contains("charset"))
        .map(|value| format!("{value}; charset=utf-8"));
    if let Some(value) = normalized {
        if let Ok(header) = HeaderValue::from_str(&value) {
            headers.insert(CONTENT_TYPE, header);
        }
    }

    Ok(res)
}

/// Resolves the caller's identity from the session cookie, falling back to
/// the remember-me cookie, and attaches it to the request. Never rejects;
/// gating is the authorization layer's job.
pub async fn authenticate(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    if let Some(state) = req.app_data::<web::Data<AppState>>() {
        if let Some(identity) = resolve_identity(state, &req) {
            req.extensions_mut().insert(CurrentUser(identity));
        }
    }

    next.call(req).await
}

fn resolve_identity(state: &AppState, req: &ServiceRequest) -> Option<AuthSession> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if let Some(identity) = state.sessions().resolve_session(cookie.value()) {
            return Some(identity);
        }
    }

    let cookie = req.cookie(AUTH_COOKIE)?;
    state.sessions().resolve_remember_token(cookie.value())
}

/// Rejects requests whose caller is absent (401) or not an administrator
/// (403) before they can reach dispatch.
pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    let user = req.extensions().get::<CurrentUser>().cloned();
    let rejection = match user {
        None => Some(ApiError::NotAuthenticated),
        Some(CurrentUser(identity)) if !identity.is_admin => Some(ApiError::Forbidden),
        Some(_) => None,
    };

    if let Some(err) = rejection {
        let response = err.error_response();
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Re-establishes an interactive session for callers who arrived on the
/// remember-me cookie alone, so the idle window starts sliding again.
pub async fn attach_session(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let refresh = match (
        req.app_data::<web::Data<AppState>>(),
        req.extensions().get::<CurrentUser>(),
    ) {
        (Some(state), Some(CurrentUser(identity))) => {
            let live_session = req
                .cookie(SESSION_COOKIE)
                .map(|cookie| state.sessions().resolve_session(cookie.value()).is_some())
                .unwrap_or(false);
            if live_session {
                None
            } else {
                Some((state.clone(), identity.clone()))
            }
        }
        _ => None,
    };

    let mut res = next.call(req).await?;

    if let Some((state, identity)) = refresh {
        let environment = state.environment();
        let token = state.sessions().open_session(identity);
        if let Err(err) = res.response_mut().add_cookie(&session_cookie(&token, environment)) {
            warn!(%err, "failed to attach refreshed session cookie");
        }
    }

    Ok(res)
}

pub fn session_cookie(token: &str, environment: Environment) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!environment.is_development())
        .finish()
}

pub fn auth_cookie(token: &str, environment: Environment) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!environment.is_development())
        .max_age(CookieDuration::days(30))
        .finish()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "").path("/").http_only(true).finish();
    cookie.make_removal();
    cookie
}
