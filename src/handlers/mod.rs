pub mod admin;
pub mod bookings;
pub mod calendar;
pub mod catalog;
pub mod health;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::AppError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/professionals/:id/services",
            get(catalog::list_services).post(catalog::create_service),
        )
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/breakdown", get(bookings::get_breakdown))
        .route("/calendar/:booking_id", get(calendar::download_ics))
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route("/api/admin/bookings/:id/cancel", post(admin::cancel_booking))
        .route("/api/admin/bookings/:id/complete", post(admin::complete_booking))
        .route("/api/admin/captures/due", get(admin::get_due_captures))
        .route("/api/admin/templates", post(admin::upsert_template))
        .route("/api/admin/templates/:name", get(admin::get_template))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub(crate) fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
