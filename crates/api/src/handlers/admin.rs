use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use carmarket_domain::storage::AccountStore;

use crate::pipeline::CurrentUser;
use crate::state::AppState;

use super::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminOverviewResponse {
    pub accounts: u64,
    pub exchange_rate_warm: bool,
    pub requested_by: String,
}

pub async fn admin_overview_handler(
    user: CurrentUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let accounts = state.storage().count_accounts().await?;
    Ok(HttpResponse::Ok().json(AdminOverviewResponse {
        accounts,
        exchange_rate_warm: state.rates().is_warm(),
        requested_by: user.0.email.to_string(),
    }))
}
