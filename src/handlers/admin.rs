use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::bookings::load_booking;
use crate::handlers::check_auth;
use crate::models::{Booking, BookingStatus, EmailTemplate};
use crate::services::booking::{breakdown_for, Viewer};
use crate::services::payment::{BalancePaymentType, PaymentBreakdown};
use crate::state::AppState;

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let status_filter = query.status.as_deref();

    let bookings = {
        let db = state.conn();
        queries::get_all_bookings(&db, status_filter, limit)?
    };

    Ok(Json(bookings))
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    transition(&state, &id, BookingStatus::Cancelled)
}

// POST /api/admin/bookings/:id/complete
pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    transition(&state, &id, BookingStatus::Completed)
}

fn transition(
    state: &AppState,
    id: &str,
    to: BookingStatus,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = load_booking(state, id)?;
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::BadRequest(format!("booking {id} is already cancelled")));
    }

    {
        let db = state.conn();
        queries::update_booking_status(&db, id, &to)?;
    }
    tracing::info!(booking_id = %id, from = booking.status.as_str(), to = to.as_str(), "booking status changed");

    Ok(Json(serde_json::json!({"ok": true, "status": to})))
}

// GET /api/admin/captures/due
#[derive(Serialize)]
pub struct DueCapture {
    booking_id: String,
    client_id: String,
    professional_id: String,
    capture_scheduled_for: DateTime<Utc>,
    balance_payment_type: BalancePaymentType,
    breakdown: PaymentBreakdown,
}

pub async fn get_due_captures(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<DueCapture>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let bookings = {
        let db = state.conn();
        queries::get_due_captures(&db, &Utc::now())?
    };

    let due = bookings
        .into_iter()
        .map(|b| DueCapture {
            breakdown: breakdown_for(&b, Viewer::Client),
            booking_id: b.id,
            client_id: b.client_id,
            professional_id: b.professional_id,
            capture_scheduled_for: b.capture_scheduled_for,
            balance_payment_type: b.balance_payment_type,
        })
        .collect();

    Ok(Json(due))
}

// GET /api/admin/templates/:name
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<EmailTemplate>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let template_id = {
        let db = state.conn();
        state.templates.resolve(&db, &name)?
    };

    match template_id {
        Some(template_id) => Ok(Json(EmailTemplate { name, template_id })),
        None => Err(AppError::NotFound(format!("email template {name}"))),
    }
}

// POST /api/admin/templates
pub async fn upsert_template(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<EmailTemplate>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if body.name.trim().is_empty() || body.template_id.trim().is_empty() {
        return Err(AppError::BadRequest("name and template_id are required".to_string()));
    }

    {
        let db = state.conn();
        queries::upsert_template(&db, &body.name, &body.template_id)?;
    }
    state.templates.invalidate()?;

    Ok(Json(serde_json::json!({"ok": true})))
}
