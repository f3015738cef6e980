use chrono::{DateTime, Datelike, SubsecRound, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::models::{Booking, BookingStatus, Service};
use crate::services::appointment::{calculate_appointment_times, calculate_total_duration};
use crate::services::payment::{calculate_payment_breakdown, BalancePaymentType, PaymentBreakdown};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("at least one service must be selected")]
    NoServices,

    #[error("unknown service for this professional: {0}")]
    UnknownService(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("deposit exceeds the booking total")]
    DepositExceedsTotal,

    #[error("appointment time out of range: {0}")]
    OutOfRange(String),

    #[error("that time slot is already booked")]
    Conflict,

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub client_id: String,
    pub professional_id: String,
    pub service_ids: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub deposit_amount: Option<Decimal>,
    pub tip_amount: Option<Decimal>,
    pub balance_payment_type: BalancePaymentType,
    pub notes: Option<String>,
}

/// Who is looking at a booking's money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewer {
    #[default]
    Client,
    Professional,
}

pub fn create_booking(
    conn: &Connection,
    request: CreateBookingRequest,
    service_fee: Decimal,
) -> Result<Booking, BookingError> {
    if request.service_ids.is_empty() {
        return Err(BookingError::NoServices);
    }

    let deposit_amount = request.deposit_amount.unwrap_or_default();
    let tip_amount = request.tip_amount.unwrap_or_default();
    if deposit_amount.is_sign_negative() {
        return Err(BookingError::InvalidAmount("deposit must not be negative".to_string()));
    }
    if tip_amount.is_sign_negative() {
        return Err(BookingError::InvalidAmount("tip must not be negative".to_string()));
    }

    let services = load_services(conn, &request.professional_id, &request.service_ids)?;
    let price = services
        .iter()
        .try_fold(Decimal::ZERO, |acc, s| acc.checked_add(s.price))
        .ok_or_else(|| BookingError::InvalidAmount("services price is too large".to_string()))?;
    let charged = price
        .checked_add(service_fee)
        .ok_or_else(|| BookingError::InvalidAmount("booking total is too large".to_string()))?;
    if deposit_amount > charged {
        return Err(BookingError::DepositExceedsTotal);
    }
    let balance_amount = charged
        .checked_add(tip_amount)
        .and_then(|v| v.checked_sub(deposit_amount))
        .ok_or_else(|| BookingError::InvalidAmount("tip is too large".to_string()))?;

    // Stored timestamps have whole seconds and four-digit years.
    let start_time = request.start_time.trunc_subsecs(0);
    let times = calculate_appointment_times(start_time, calculate_total_duration(&services));
    if times.appointment_start.year() < MIN_YEAR || times.capture_scheduled_for.year() > MAX_YEAR {
        return Err(BookingError::OutOfRange(format!(
            "{} to {}",
            times.appointment_start, times.capture_scheduled_for
        )));
    }

    let overlapping = queries::get_overlapping_bookings(
        conn,
        &request.professional_id,
        &times.appointment_start,
        &times.appointment_end,
    )?;
    if !overlapping.is_empty() {
        tracing::info!(
            professional_id = %request.professional_id,
            start = %times.appointment_start,
            "rejected overlapping booking"
        );
        return Err(BookingError::Conflict);
    }

    let now = Utc::now().trunc_subsecs(0);
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        client_id: request.client_id,
        professional_id: request.professional_id,
        service_ids: request.service_ids,
        appointment_start: times.appointment_start,
        appointment_end: times.appointment_end,
        capture_scheduled_for: times.capture_scheduled_for,
        deposit_amount,
        balance_amount,
        tip_amount,
        service_fee,
        balance_payment_type: request.balance_payment_type,
        status: BookingStatus::Confirmed,
        notes: request.notes,
        created_at: now,
        updated_at: now,
    };

    queries::create_booking(conn, &booking)?;
    tracing::info!(
        booking_id = %booking.id,
        capture_scheduled_for = %booking.capture_scheduled_for,
        "booking created"
    );

    Ok(booking)
}

fn load_services(
    conn: &Connection,
    professional_id: &str,
    service_ids: &[String],
) -> Result<Vec<Service>, BookingError> {
    let mut services = Vec::with_capacity(service_ids.len());
    for id in service_ids {
        match queries::get_service_by_id(conn, id)? {
            Some(service) if service.professional_id == professional_id => services.push(service),
            _ => return Err(BookingError::UnknownService(id.clone())),
        }
    }
    Ok(services)
}

pub fn breakdown_for(booking: &Booking, viewer: Viewer) -> PaymentBreakdown {
    calculate_payment_breakdown(
        &booking.payment(),
        viewer == Viewer::Client,
        booking.balance_payment_type,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn setup_db() -> Connection {
        let conn = db::init_db(":memory:").unwrap();
        let now = Utc::now();
        for (id, pro, name, minutes, price) in [
            ("svc-cut", "pro-1", "Silk press", 45, 4000),
            ("svc-color", "pro-1", "Gloss", 30, 2500),
            ("svc-other", "pro-2", "Lash fill", 60, 7000),
        ] {
            queries::create_service(
                &conn,
                &Service {
                    id: id.to_string(),
                    professional_id: pro.to_string(),
                    name: name.to_string(),
                    duration_minutes: minutes,
                    price: Decimal::new(price, 2),
                    created_at: now,
                },
            )
            .unwrap();
        }
        conn
    }

    fn request(service_ids: &[&str], start: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            client_id: "client-1".to_string(),
            professional_id: "pro-1".to_string(),
            service_ids: service_ids.iter().map(|s| s.to_string()).collect(),
            start_time: ts(start),
            deposit_amount: Some(Decimal::new(20, 0)),
            tip_amount: Some(Decimal::new(10, 0)),
            balance_payment_type: BalancePaymentType::Card,
            notes: None,
        }
    }

    #[test]
    fn test_create_booking_computes_times_and_balance() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            request(&["svc-cut", "svc-color"], "2025-06-16T10:00:00Z"),
            Decimal::new(5, 0),
        )
        .unwrap();

        assert_eq!(booking.appointment_end, ts("2025-06-16T11:15:00Z"));
        assert_eq!(booking.capture_scheduled_for, ts("2025-06-16T23:15:00Z"));
        // 65 price + 5 fee + 10 tip - 20 deposit
        assert_eq!(booking.balance_amount, Decimal::new(60, 0));
        assert_eq!(booking.status, BookingStatus::Confirmed);

        let stored = queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored.balance_amount, booking.balance_amount);
    }

    #[test]
    fn test_breakdown_views() {
        let conn = setup_db();
        let booking = create_booking(
            &conn,
            request(&["svc-cut", "svc-color"], "2025-06-16T10:00:00Z"),
            Decimal::new(5, 0),
        )
        .unwrap();

        let client = breakdown_for(&booking, Viewer::Client);
        assert_eq!(client.total, Decimal::new(80, 0));
        assert_eq!(client.card_balance, Decimal::new(50, 0));
        assert_eq!(client.service_fee, Some(Decimal::new(5, 0)));

        let pro = breakdown_for(&booking, Viewer::Professional);
        assert_eq!(pro.total, Decimal::new(75, 0));
        assert_eq!(pro.deposit, Decimal::new(15, 0));
        assert_eq!(pro.service_fee, None);
    }

    #[test]
    fn test_no_services_rejected() {
        let conn = setup_db();
        let result = create_booking(&conn, request(&[], "2025-06-16T10:00:00Z"), Decimal::ZERO);
        assert!(matches!(result, Err(BookingError::NoServices)));
    }

    #[test]
    fn test_other_professionals_service_rejected() {
        let conn = setup_db();
        let result = create_booking(
            &conn,
            request(&["svc-cut", "svc-other"], "2025-06-16T10:00:00Z"),
            Decimal::ZERO,
        );
        assert!(matches!(result, Err(BookingError::UnknownService(id)) if id == "svc-other"));
    }

    #[test]
    fn test_negative_tip_rejected() {
        let conn = setup_db();
        let mut req = request(&["svc-cut"], "2025-06-16T10:00:00Z");
        req.tip_amount = Some(Decimal::new(-1, 0));
        let result = create_booking(&conn, req, Decimal::ZERO);
        assert!(matches!(result, Err(BookingError::InvalidAmount(_))));
    }

    #[test]
    fn test_deposit_above_total_rejected() {
        let conn = setup_db();
        let mut req = request(&["svc-color"], "2025-06-16T10:00:00Z");
        req.deposit_amount = Some(Decimal::new(3001, 2));
        let result = create_booking(&conn, req, Decimal::new(5, 0));
        assert!(matches!(result, Err(BookingError::DepositExceedsTotal)));
    }

    #[test]
    fn test_overlapping_booking_rejected() {
        let conn = setup_db();
        create_booking(&conn, request(&["svc-cut"], "2025-06-16T10:00:00Z"), Decimal::ZERO).unwrap();

        let result = create_booking(&conn, request(&["svc-color"], "2025-06-16T10:30:00Z"), Decimal::ZERO);
        assert!(matches!(result, Err(BookingError::Conflict)));
    }

    #[test]
    fn test_adjacent_booking_allowed() {
        let conn = setup_db();
        create_booking(&conn, request(&["svc-cut"], "2025-06-16T10:00:00Z"), Decimal::ZERO).unwrap();

        // svc-cut runs 45 minutes, so 10:45 starts exactly when it ends
        let result = create_booking(&conn, request(&["svc-color"], "2025-06-16T10:45:00Z"), Decimal::ZERO);
        assert!(result.is_ok());
    }

    #[test]
    fn test_cancelled_booking_frees_slot() {
        let conn = setup_db();
        let first =
            create_booking(&conn, request(&["svc-cut"], "2025-06-16T10:00:00Z"), Decimal::ZERO).unwrap();
        queries::update_booking_status(&conn, &first.id, &BookingStatus::Cancelled).unwrap();

        let result = create_booking(&conn, request(&["svc-cut"], "2025-06-16T10:00:00Z"), Decimal::ZERO);
        assert!(result.is_ok());
    }

    #[test]
    fn test_oversized_tip_rejected() {
        let conn = setup_db();
        let mut req = request(&["svc-cut"], "2025-06-16T10:00:00Z");
        req.tip_amount = Some(Decimal::MAX);
        let result = create_booking(&conn, req, Decimal::new(5, 0));
        assert!(matches!(result, Err(BookingError::InvalidAmount(_))));

        // Connection stays usable and the slot stays free
        let result = create_booking(&conn, request(&["svc-cut"], "2025-06-16T10:00:00Z"), Decimal::ZERO);
        assert!(result.is_ok());
    }

    #[test]
    fn test_capture_past_year_9999_rejected() {
        let conn = setup_db();
        let result = create_booking(&conn, request(&["svc-cut"], "9999-12-31T23:00:00Z"), Decimal::ZERO);
        assert!(matches!(result, Err(BookingError::OutOfRange(_))));
    }

    #[test]
    fn test_subsecond_start_matches_stored_booking() {
        let conn = setup_db();
        let booking =
            create_booking(&conn, request(&["svc-cut"], "2025-06-16T10:00:00.750Z"), Decimal::ZERO).unwrap();
        assert_eq!(booking.appointment_start, ts("2025-06-16T10:00:00Z"));

        let stored = queries::get_booking_by_id(&conn, &booking.id).unwrap().unwrap();
        assert_eq!(stored.appointment_start, booking.appointment_start);
        assert_eq!(stored.appointment_end, booking.appointment_end);
        assert_eq!(stored.capture_scheduled_for, booking.capture_scheduled_for);
        assert_eq!(stored.created_at, booking.created_at);
    }
}
