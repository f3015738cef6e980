use crate::models::Booking;

const ICS_FORMAT: &str = "%Y%m%dT%H%M%SZ";

pub fn generate_ics(booking: &Booking, title: &str) -> String {
    let dtstart = booking.appointment_start.format(ICS_FORMAT).to_string();
    let dtend = booking.appointment_end.format(ICS_FORMAT).to_string();
    let dtstamp = booking.created_at.format(ICS_FORMAT).to_string();
    let uid = format!("{}@suite", booking.id);

    let summary = escape_text(&format!("Appointment at {title}"));
    let description = booking
        .notes
        .as_deref()
        .map(escape_text)
        .unwrap_or_else(|| "No additional notes".to_string());

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//The Suite//Bookings//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}

// RFC 5545 TEXT escaping
fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}
