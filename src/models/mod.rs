pub mod booking;
pub mod service;
pub mod template;

pub use booking::{Booking, BookingStatus};
pub use service::Service;
pub use template::EmailTemplate;
