use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::appointment::ServiceDuration;

/// A catalog entry offered by a professional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub professional_id: String,
    pub name: String,
    pub duration_minutes: u32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl ServiceDuration for Service {
    fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}
