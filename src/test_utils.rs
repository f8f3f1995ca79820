// src/test_utils.rs
// Fixtures para os testes que rodam contra o Postgres (`#[sqlx::test]`).

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    db::{AvailabilityRepository, BookingRepository, CatalogRepository},
    models::{
        availability::{AvailabilityRule, UpdateSettingsRequest},
        catalog::{Provider, ProviderService},
    },
    services::{availability_service::AvailabilityService, booking_service::BookingService},
};

// Segunda-feira, bem no futuro
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
}

pub fn monday_at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 7, h, m, 0).unwrap()
}

pub fn long_before() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2029, 12, 1, 0, 0, 0).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn availability_service() -> AvailabilityService {
    AvailabilityService::new(
        AvailabilityRepository::new(),
        BookingRepository::new(),
        CatalogRepository::new(),
    )
}

pub fn booking_service(pool: &PgPool) -> BookingService {
    BookingService::new(
        pool.clone(),
        AvailabilityRepository::new(),
        BookingRepository::new(),
        CatalogRepository::new(),
    )
}

pub async fn create_test_provider(pool: &PgPool) -> Provider {
    sqlx::query_as::<_, Provider>(
        "INSERT INTO providers (user_id, display_name) VALUES ($1, $2) RETURNING *",
    )
        .bind(Uuid::new_v4())
        .bind("Studio da Ana")
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_service(pool: &PgPool, provider_id: Uuid, duration_minutes: i32) -> ProviderService {
    sqlx::query_as::<_, ProviderService>(
        r#"
        INSERT INTO services (provider_id, name, duration_minutes, price)
        VALUES ($1, 'Corte', $2, $3)
        RETURNING id, provider_id, name, description, duration_minutes, price, location, is_active
        "#,
    )
        .bind(provider_id)
        .bind(duration_minutes)
        .bind(Decimal::new(8000, 2))
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_rule(
    pool: &PgPool,
    provider_id: Uuid,
    day_of_week: i16,
    start: NaiveTime,
    end: NaiveTime,
    is_active: bool,
) -> AvailabilityRule {
    let repo = AvailabilityRepository::new();
    let rule = repo
        .create_rule(pool, provider_id, day_of_week, start, end)
        .await
        .unwrap();
    if is_active {
        return rule;
    }
    repo.update_rule(pool, provider_id, rule.id, start, end, false)
        .await
        .unwrap()
}

pub async fn set_daily_cap(pool: &PgPool, provider_id: Uuid, cap: i32) {
    let settings = UpdateSettingsRequest {
        min_lead_time_hours: 0,
        max_bookings_per_day: Some(cap),
        timezone: "UTC".to_string(),
    };
    AvailabilityRepository::new()
        .upsert_settings(pool, provider_id, &settings)
        .await
        .unwrap();
}
