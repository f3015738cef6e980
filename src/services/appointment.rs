use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Hours between the end of an appointment and the capture of its card payment.
pub const CAPTURE_DELAY_HOURS: i64 = 12;

/// Anything that contributes a duration (in minutes) to an appointment.
pub trait ServiceDuration {
    fn duration_minutes(&self) -> u32;
}

impl ServiceDuration for u32 {
    fn duration_minutes(&self) -> u32 {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppointmentTimes {
    pub appointment_start: DateTime<Utc>,
    pub appointment_end: DateTime<Utc>,
    pub capture_scheduled_for: DateTime<Utc>,
}

/// Saturates at `u32::MAX` minutes.
pub fn calculate_total_duration<S: ServiceDuration>(services: &[S]) -> u32 {
    services
        .iter()
        .fold(0u32, |acc, s| acc.saturating_add(s.duration_minutes()))
}

pub fn calculate_appointment_times(
    start_time: DateTime<Utc>,
    total_duration_minutes: u32,
) -> AppointmentTimes {
    // Clamp at the last representable instant instead of overflowing.
    let appointment_end = start_time
        .checked_add_signed(Duration::minutes(i64::from(total_duration_minutes)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    AppointmentTimes {
        appointment_start: start_time,
        appointment_end,
        capture_scheduled_for: appointment_end
            .checked_add_signed(Duration::hours(CAPTURE_DELAY_HOURS))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}
