pub mod appointment;
pub mod booking;
pub mod calendar;
pub mod format;
pub mod payment;
pub mod templates;
