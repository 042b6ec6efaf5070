use actix_web::{web, HttpResponse};

use crate::state::AppState;

pub async fn metrics_handler(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4; charset=utf-8")
        .body(state.telemetry().render_metrics())
}
