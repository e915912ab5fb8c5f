use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// A stored waste entry. Wasted amount and percentage are never persisted,
/// see `services::wasted` and `services::waste_percentage`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WasteRecord {
    pub id: i64,
    pub school_name: String,
    pub meal_type: String,
    pub food_prepared: f64,
    pub food_served: f64,
    pub date: Date,
    pub created_at: OffsetDateTime,
}

/// Fields supplied by the caller when creating a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWasteRecord {
    pub school_name: String,
    pub meal_type: String,
    pub food_prepared: f64,
    pub food_served: f64,
    pub date: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}
