use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ExchangeRateResponse {
    pub rate: Decimal,
    pub fetched_at: Option<DateTime<Utc>>,
    pub warm: bool,
}

/// Non-blocking snapshot of the cached CRC/USD rate; serves the fallback
/// while the warmer has not (yet) succeeded.
pub async fn exchange_rate_handler(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.rates().current();
    HttpResponse::Ok().json(ExchangeRateResponse {
        rate: snapshot.value,
        fetched_at: snapshot.fetched_at,
        warm: snapshot.is_warm(),
    })
}
