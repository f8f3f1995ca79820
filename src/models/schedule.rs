// src/models/schedule.rs
// Respostas das consultas de disponibilidade (somente leitura).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    availability::AvailabilityException,
    booking::{Booking, BookingStatus},
    catalog::{Provider, ProviderService},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBooking {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
}

impl From<&Booking> for ScheduleBooking {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id,
            start_time: b.start_datetime,
            end_time: b.end_datetime,
            status: b.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleException {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub exception_type: String,
}

impl From<&AvailabilityException> for ScheduleException {
    fn from(e: &AvailabilityException) -> Self {
        Self {
            id: e.id,
            start_time: e.start_datetime,
            end_time: e.end_datetime,
            exception_type: e.exception_type.clone(),
        }
    }
}

// GET /api/me/schedule
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    #[schema(value_type = String, example = "2030-01-07")]
    pub date: NaiveDate,
    #[schema(example = "America/Sao_Paulo")]
    pub timezone: String,
    pub available_slots: Vec<SlotView>,
    pub bookings: Vec<ScheduleBooking>,
    pub exceptions: Vec<ScheduleException>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub location: Option<String>,
}

impl From<&ProviderService> for ServiceSummary {
    fn from(s: &ProviderService) -> Self {
        Self {
            id: s.id,
            name: s.name.clone(),
            duration_minutes: s.duration_minutes,
            price: s.price,
            location: s.location.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: Uuid,
    pub display_name: String,
}

impl From<&Provider> for ProviderSummary {
    fn from(p: &Provider) -> Self {
        Self {
            id: p.id,
            display_name: p.display_name.clone(),
        }
    }
}

// GET /api/services/{id}/slots
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSlotsResponse {
    #[schema(value_type = String, example = "2030-01-07")]
    pub date: NaiveDate,
    pub timezone: String,
    pub slots: Vec<DateTime<Utc>>,
    pub service: ServiceSummary,
    pub provider: ProviderSummary,
}
