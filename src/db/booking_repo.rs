// src/db/booking_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_booking_write_error, error::AppError, interval::Interval},
    models::booking::{Booking, BookingStatus},
};

#[derive(Clone, Default)]
pub struct BookingRepository;

impl BookingRepository {
    pub fn new() -> Self {
        Self
    }

    // Agendamentos que ocupam a agenda (pending/confirmed) e encostam na janela.
    // Semiaberto: um agendamento que termina exatamente no início da janela fica de fora.
    pub async fn list_active_overlapping<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        window: Interval,
    ) -> Result<Vec<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE provider_id = $1
              AND status IN ('pending', 'confirmed')
              AND start_datetime < $3
              AND end_datetime > $2
            ORDER BY start_datetime
            "#,
        )
            .bind(provider_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(executor)
            .await?;

        Ok(bookings)
    }

    pub async fn insert_booking<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        service_id: Uuid,
        client_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: BookingStatus,
        notes: Option<&str>,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings
                (provider_id, service_id, client_id, start_datetime, end_datetime, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
            .bind(provider_id)
            .bind(service_id)
            .bind(client_id)
            .bind(start)
            .bind(end)
            .bind(status)
            .bind(notes)
            .fetch_one(executor)
            .await
            // A EXCLUDE constraint vira "horário não está mais disponível"
            .map_err(map_booking_write_error)
    }

    pub async fn find_for_update<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(booking_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::BookingNotFound)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        booking_id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
            .bind(booking_id)
            .bind(status)
            .fetch_optional(executor)
            .await
            .map_err(map_booking_write_error)?
            .ok_or(AppError::BookingNotFound)
    }
}
