// src/db/availability_repo.rs

use chrono::NaiveTime;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, interval::Interval},
    models::availability::{
        AvailabilityException, AvailabilityRule, ProviderAvailabilitySettings, UpdateSettingsRequest,
    },
};

// Regras semanais, exceções pontuais e configurações de agenda do prestador.
// Só acesso a dados: nenhuma regra de negócio mora aqui.
#[derive(Clone, Default)]
pub struct AvailabilityRepository;

impl AvailabilityRepository {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  CONFIGURAÇÕES
    // =========================================================================

    pub async fn get_settings<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
    ) -> Result<ProviderAvailabilitySettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, ProviderAvailabilitySettings>(
            r#"
            SELECT provider_id, min_lead_time_hours, max_bookings_per_day, timezone, updated_at
            FROM provider_availability_settings
            WHERE provider_id = $1
            "#,
        )
            .bind(provider_id)
            .fetch_optional(executor)
            .await?;

        // Sem linha = valores padrão (sem antecedência, sem limite diário)
        Ok(settings.unwrap_or_else(|| ProviderAvailabilitySettings::defaults(provider_id)))
    }

    pub async fn upsert_settings<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<ProviderAvailabilitySettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, ProviderAvailabilitySettings>(
            r#"
            INSERT INTO provider_availability_settings
                (provider_id, min_lead_time_hours, max_bookings_per_day, timezone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (provider_id)
            DO UPDATE SET
                min_lead_time_hours = EXCLUDED.min_lead_time_hours,
                max_bookings_per_day = EXCLUDED.max_bookings_per_day,
                timezone = EXCLUDED.timezone,
                updated_at = NOW()
            RETURNING provider_id, min_lead_time_hours, max_bookings_per_day, timezone, updated_at
            "#,
        )
            .bind(provider_id)
            .bind(input.min_lead_time_hours)
            .bind(input.max_bookings_per_day)
            .bind(&input.timezone)
            .fetch_one(executor)
            .await?;

        Ok(settings)
    }

    // =========================================================================
    //  REGRAS SEMANAIS
    // =========================================================================

    pub async fn list_active_rules_for_day<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        day_of_week: i16,
    ) -> Result<Vec<AvailabilityRule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rules = sqlx::query_as::<_, AvailabilityRule>(
            r#"
            SELECT * FROM availability_rules
            WHERE provider_id = $1 AND day_of_week = $2 AND is_active = TRUE
            ORDER BY start_time
            "#,
        )
            .bind(provider_id)
            .bind(day_of_week)
            .fetch_all(executor)
            .await?;

        Ok(rules)
    }

    pub async fn list_rules<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
    ) -> Result<Vec<AvailabilityRule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rules = sqlx::query_as::<_, AvailabilityRule>(
            r#"
            SELECT * FROM availability_rules
            WHERE provider_id = $1
            ORDER BY day_of_week, start_time
            "#,
        )
            .bind(provider_id)
            .fetch_all(executor)
            .await?;

        Ok(rules)
    }

    pub async fn find_rule<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        rule_id: Uuid,
    ) -> Result<AvailabilityRule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, AvailabilityRule>(
            "SELECT * FROM availability_rules WHERE id = $1 AND provider_id = $2",
        )
            .bind(rule_id)
            .bind(provider_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::RuleNotFound)
    }

    pub async fn create_rule<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        day_of_week: i16,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<AvailabilityRule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rule = sqlx::query_as::<_, AvailabilityRule>(
            r#"
            INSERT INTO availability_rules (provider_id, day_of_week, start_time, end_time)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
            .bind(provider_id)
            .bind(day_of_week)
            .bind(start_time)
            .bind(end_time)
            .fetch_one(executor)
            .await?;

        Ok(rule)
    }

    pub async fn update_rule<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        rule_id: Uuid,
        start_time: NaiveTime,
        end_time: NaiveTime,
        is_active: bool,
    ) -> Result<AvailabilityRule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, AvailabilityRule>(
            r#"
            UPDATE availability_rules
            SET start_time = $3, end_time = $4, is_active = $5, updated_at = NOW()
            WHERE id = $1 AND provider_id = $2
            RETURNING *
            "#,
        )
            .bind(rule_id)
            .bind(provider_id)
            .bind(start_time)
            .bind(end_time)
            .bind(is_active)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::RuleNotFound)
    }

    // =========================================================================
    //  EXCEÇÕES
    // =========================================================================

    // Sobreposição semiaberta com a janela: start < fim AND end > início
    pub async fn list_exceptions_overlapping<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        window: Interval,
    ) -> Result<Vec<AvailabilityException>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exceptions = sqlx::query_as::<_, AvailabilityException>(
            r#"
            SELECT * FROM availability_exceptions
            WHERE provider_id = $1
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

        Ok(exceptions)
    }

    pub async fn create_exception<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        window: Interval,
        exception_type: &str,
        reason: Option<&str>,
    ) -> Result<AvailabilityException, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exception = sqlx::query_as::<_, AvailabilityException>(
            r#"
            INSERT INTO availability_exceptions
                (provider_id, start_datetime, end_datetime, exception_type, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
            .bind(provider_id)
            .bind(window.start)
            .bind(window.end)
            .bind(exception_type)
            .bind(reason)
            .fetch_one(executor)
            .await?;

        Ok(exception)
    }

    pub async fn delete_exception<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
        exception_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM availability_exceptions WHERE id = $1 AND provider_id = $2",
        )
            .bind(exception_id)
            .bind(provider_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ExceptionNotFound);
        }
        Ok(())
    }
}
