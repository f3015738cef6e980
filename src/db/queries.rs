use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use crate::models::{Booking, BookingStatus, Service};
use crate::services::payment::BalancePaymentType;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "id, client_id, professional_id, service_ids, appointment_start, appointment_end, \
     capture_scheduled_for, deposit_amount, balance_amount, tip_amount, service_fee, balance_payment_type, \
     status, notes, created_at, updated_at";

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid stored timestamp: {s}"))?;
    Ok(naive.and_utc())
}

fn parse_amount(s: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("invalid stored amount: {s}"))
}

// ── Services ──

pub fn create_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, professional_id, name, duration_minutes, price, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            service.id,
            service.professional_id,
            service.name,
            service.duration_minutes,
            service.price.to_string(),
            format_timestamp(&service.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_service_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        "SELECT id, professional_id, name, duration_minutes, price, created_at FROM services WHERE id = ?1",
        params![id],
        |row| Ok(parse_service_row(row)),
    );

    match result {
        Ok(service) => Ok(Some(service?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_services_for_professional(
    conn: &Connection,
    professional_id: &str,
) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(
        "SELECT id, professional_id, name, duration_minutes, price, created_at
         FROM services WHERE professional_id = ?1 ORDER BY name ASC",
    )?;

    let rows = stmt.query_map(params![professional_id], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let price_str: String = row.get(4)?;
    let created_at_str: String = row.get(5)?;

    Ok(Service {
        id: row.get(0)?,
        professional_id: row.get(1)?,
        name: row.get(2)?,
        duration_minutes: row.get(3)?,
        price: parse_amount(&price_str)?,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let service_ids = serde_json::to_string(&booking.service_ids)?;

    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        ),
        params![
            booking.id,
            booking.client_id,
            booking.professional_id,
            service_ids,
            format_timestamp(&booking.appointment_start),
            format_timestamp(&booking.appointment_end),
            format_timestamp(&booking.capture_scheduled_for),
            booking.deposit_amount.to_string(),
            booking.balance_amount.to_string(),
            booking.tip_amount.to_string(),
            booking.service_fee.to_string(),
            booking.balance_payment_type.as_str(),
            booking.status.as_str(),
            booking.notes,
            format_timestamp(&booking.created_at),
            format_timestamp(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-cancelled bookings of a professional that overlap `[start, end)`.
pub fn get_overlapping_bookings(
    conn: &Connection,
    professional_id: &str,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE professional_id = ?1 AND appointment_start < ?3 AND appointment_end > ?2
           AND status != 'cancelled'
         ORDER BY appointment_start ASC"
    ))?;

    let rows = stmt.query_map(
        params![professional_id, format_timestamp(start), format_timestamp(end)],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let now = format_timestamp(&Utc::now());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 \
                 ORDER BY appointment_start DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY appointment_start DESC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Confirmed or completed bookings whose card capture is due at `now`.
pub fn get_due_captures(conn: &Connection, now: &DateTime<Utc>) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE status IN ('confirmed', 'completed') AND capture_scheduled_for <= ?1
         ORDER BY capture_scheduled_for ASC"
    ))?;

    let rows = stmt.query_map(params![format_timestamp(now)], |row| {
        Ok(parse_booking_row(row))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let service_ids_json: String = row.get(3)?;
    let appointment_start_str: String = row.get(4)?;
    let appointment_end_str: String = row.get(5)?;
    let capture_str: String = row.get(6)?;
    let deposit_str: String = row.get(7)?;
    let balance_str: String = row.get(8)?;
    let tip_str: String = row.get(9)?;
    let fee_str: String = row.get(10)?;
    let payment_type_str: String = row.get(11)?;
    let status_str: String = row.get(12)?;
    let created_at_str: String = row.get(14)?;
    let updated_at_str: String = row.get(15)?;

    Ok(Booking {
        id: row.get(0)?,
        client_id: row.get(1)?,
        professional_id: row.get(2)?,
        service_ids: serde_json::from_str(&service_ids_json)
            .with_context(|| format!("invalid stored service ids: {service_ids_json}"))?,
        appointment_start: parse_timestamp(&appointment_start_str)?,
        appointment_end: parse_timestamp(&appointment_end_str)?,
        capture_scheduled_for: parse_timestamp(&capture_str)?,
        deposit_amount: parse_amount(&deposit_str)?,
        balance_amount: parse_amount(&balance_str)?,
        tip_amount: parse_amount(&tip_str)?,
        service_fee: parse_amount(&fee_str)?,
        balance_payment_type: BalancePaymentType::parse(&payment_type_str),
        status: BookingStatus::parse(&status_str),
        notes: row.get(13)?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

// ── Email Templates ──

pub fn get_template_id(conn: &Connection, name: &str) -> anyhow::Result<Option<String>> {
    let result = conn.query_row(
        "SELECT template_id FROM email_templates WHERE name = ?1",
        params![name],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn upsert_template(conn: &Connection, name: &str, template_id: &str) -> anyhow::Result<()> {
    let now = format_timestamp(&Utc::now());
    conn.execute(
        "INSERT INTO email_templates (name, template_id, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET template_id = excluded.template_id, updated_at = excluded.updated_at",
        params![name, template_id, now],
    )?;
    Ok(())
}
