use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Booking;
use crate::services::booking::{self as booking_service, CreateBookingRequest, Viewer};
use crate::services::format::format_currency;
use crate::services::payment::{BalancePaymentType, PaymentBreakdown};
use crate::state::AppState;

pub(crate) fn load_booking(state: &AppState, id: &str) -> Result<Booking, AppError> {
    let db = state.conn();
    queries::get_booking_by_id(&db, id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingBody {
    pub client_id: String,
    pub professional_id: String,
    pub service_ids: Vec<String>,
    /// RFC 3339 instant.
    pub start_time: String,
    pub deposit_amount: Option<Decimal>,
    pub tip_amount: Option<Decimal>,
    pub balance_payment_type: BalancePaymentType,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let start_time = DateTime::parse_from_rfc3339(&body.start_time)
        .map_err(|e| AppError::BadRequest(format!("invalid start_time {:?}: {e}", body.start_time)))?
        .with_timezone(&Utc);

    let request = CreateBookingRequest {
        client_id: body.client_id,
        professional_id: body.professional_id,
        service_ids: body.service_ids,
        start_time,
        deposit_amount: body.deposit_amount,
        tip_amount: body.tip_amount,
        balance_payment_type: body.balance_payment_type,
        notes: body.notes,
    };

    let booking = {
        let db = state.conn();
        booking_service::create_booking(&db, request, state.config.service_fee)?
    };

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(load_booking(&state, &id)?))
}

// GET /api/bookings/:id/breakdown
#[derive(Deserialize)]
pub struct BreakdownQuery {
    pub view: Option<Viewer>,
}

#[derive(Serialize)]
pub struct FormattedBreakdown {
    tips: String,
    deposit: String,
    card_balance: String,
    cash_balance: String,
    total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_fee: Option<String>,
}

impl From<&PaymentBreakdown> for FormattedBreakdown {
    fn from(b: &PaymentBreakdown) -> Self {
        Self {
            tips: format_currency(b.tips),
            deposit: format_currency(b.deposit),
            card_balance: format_currency(b.card_balance),
            cash_balance: format_currency(b.cash_balance),
            total: format_currency(b.total),
            service_fee: b.service_fee.map(format_currency),
        }
    }
}

#[derive(Serialize)]
pub struct BreakdownResponse {
    booking_id: String,
    view: Viewer,
    balance_payment_type: BalancePaymentType,
    breakdown: PaymentBreakdown,
    formatted: FormattedBreakdown,
}

pub async fn get_breakdown(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<BreakdownQuery>,
) -> Result<Json<BreakdownResponse>, AppError> {
    let booking = load_booking(&state, &id)?;
    let view = query.view.unwrap_or_default();
    let breakdown = booking_service::breakdown_for(&booking, view);

    Ok(Json(BreakdownResponse {
        formatted: FormattedBreakdown::from(&breakdown),
        booking_id: booking.id,
        view,
        balance_payment_type: booking.balance_payment_type,
        breakdown,
    }))
}
