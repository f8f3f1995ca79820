// src/models/booking.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::interval::Interval;

// --- Enums ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    Disputed,
}

impl BookingStatus {
    // Só pendentes e confirmados ocupam a agenda
    pub fn occupies_time(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub client_id: Uuid,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start_datetime, self.end_datetime)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub service_id: Uuid,

    // Um dos horários devolvidos por /api/services/{id}/slots
    #[schema(example = "2030-01-07T12:00:00Z")]
    pub start_time: DateTime<Utc>,

    #[validate(length(max = 500, message = "As observações devem ter no máximo 500 caracteres."))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_and_confirmed_occupy_time() {
        assert!(BookingStatus::Pending.occupies_time());
        assert!(BookingStatus::Confirmed.occupies_time());
        assert!(!BookingStatus::Cancelled.occupies_time());
        assert!(!BookingStatus::Completed.occupies_time());
        assert!(!BookingStatus::Disputed.occupies_time());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_value(BookingStatus::Confirmed).unwrap(), "confirmed");
    }
}
