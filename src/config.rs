use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::errors::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Flat platform fee charged on every booking.
    pub service_fee: Decimal,
    pub calendar_title: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let service_fee = match env::var("SERVICE_FEE") {
            Ok(raw) => Decimal::from_str(raw.trim())
                .map_err(|e| AppError::Config(format!("SERVICE_FEE={raw}: {e}")))?,
            Err(_) => Decimal::new(500, 2),
        };
        if service_fee.is_sign_negative() {
            return Err(AppError::Config("SERVICE_FEE must not be negative".to_string()));
        }

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "suite.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            service_fee,
            calendar_title: env::var("CALENDAR_TITLE").unwrap_or_else(|_| "The Suite".to_string()),
        })
    }
}
