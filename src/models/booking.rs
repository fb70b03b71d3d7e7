use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A slot that passed validation and was handed back to the caller as scheduled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub caller_id: String,
    pub customer_name: String,
    pub service: String,
    pub date: String,
    pub time: String,
    pub created_at: NaiveDateTime,
}

impl Booking {
    pub fn new(caller_id: &str, customer_name: &str, service: &str, date: &str, time: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            caller_id: caller_id.to_string(),
            customer_name: customer_name.to_string(),
            service: service.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            created_at: Utc::now().naive_utc(),
        }
    }
}
