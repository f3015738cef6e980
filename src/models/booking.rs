use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::payment::{BalancePaymentType, BookingPayment};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub client_id: String,
    pub professional_id: String,
    pub service_ids: Vec<String>,
    pub appointment_start: DateTime<Utc>,
    pub appointment_end: DateTime<Utc>,
    pub capture_scheduled_for: DateTime<Utc>,
    pub deposit_amount: Decimal,
    /// Remaining amount after the deposit, tip and service fee included.
    pub balance_amount: Decimal,
    pub tip_amount: Decimal,
    pub service_fee: Decimal,
    pub balance_payment_type: BalancePaymentType,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn payment(&self) -> BookingPayment {
        BookingPayment {
            tip_amount: Some(self.tip_amount),
            service_fee: Some(self.service_fee),
            deposit_amount: Some(self.deposit_amount),
            balance_amount: Some(self.balance_amount),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "completed" => BookingStatus::Completed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}
