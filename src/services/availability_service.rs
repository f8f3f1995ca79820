// src/services/availability_service.rs

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::ValidationError;

use crate::{
    common::{
        calendar::{timezone_or_utc, LocalDay},
        error::{invalid_field, AppError},
        interval::Interval,
    },
    db::{AvailabilityRepository, BookingRepository, CatalogRepository},
    models::{
        availability::{
            AvailabilityException, AvailabilityRule, CreateExceptionRequest, CreateRuleRequest,
            is_valid_rule_window, ProviderAvailabilitySettings, UpdateRuleRequest,
            UpdateSettingsRequest, BLOCKED_EXCEPTION_TYPE,
        },
        catalog::{Provider, ProviderService},
        schedule::{
            ProviderSummary, ScheduleBooking, ScheduleException, ScheduleResponse, ServiceSlotsResponse,
            ServiceSummary, SlotView,
        },
    },
    services::slot_generator::{generate_slots, DaySnapshot},
};

// Duração usada para desenhar os horários livres na agenda do prestador
pub const DISPLAY_SLOT_MINUTES: i64 = 60;

// Janela padrão da listagem de exceções
const DEFAULT_EXCEPTION_RANGE_DAYS: i64 = 30;

#[derive(Clone)]
pub struct AvailabilityService {
    availability_repo: AvailabilityRepository,
    booking_repo: BookingRepository,
    catalog_repo: CatalogRepository,
}

impl AvailabilityService {
    pub fn new(
        availability_repo: AvailabilityRepository,
        booking_repo: BookingRepository,
        catalog_repo: CatalogRepository,
    ) -> Self {
        Self {
            availability_repo,
            booking_repo,
            catalog_repo,
        }
    }

    // =========================================================================
    //  CARREGADOR (foto do dia)
    // =========================================================================

    // As quatro leituras NÃO estão numa mesma transação: a foto é consultiva.
    // Quem garante a consistência é o commit do agendamento.
    pub async fn load_day(
        &self,
        pool: &PgPool,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<DaySnapshot, AppError> {
        let settings = self.availability_repo.get_settings(pool, provider_id).await?;
        let day = LocalDay::new(date, timezone_or_utc(&settings.timezone))?;
        let window = day.window();

        let (rules, exceptions, bookings) = tokio::try_join!(
            self.availability_repo
                .list_active_rules_for_day(pool, provider_id, day.day_of_week()),
            self.availability_repo
                .list_exceptions_overlapping(pool, provider_id, window),
            self.booking_repo.list_active_overlapping(pool, provider_id, window),
        )?;

        Ok(DaySnapshot {
            day,
            rules,
            exceptions,
            bookings,
            settings,
        })
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    // GET /api/me/schedule
    pub async fn provider_schedule(
        &self,
        pool: &PgPool,
        provider: &Provider,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ScheduleResponse, AppError> {
        let snapshot = self.load_day(pool, provider.id, date).await?;
        Ok(schedule_view(&snapshot, now))
    }

    // GET /api/services/{id}/slots
    pub async fn service_slots(
        &self,
        pool: &PgPool,
        service_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ServiceSlotsResponse, AppError> {
        let service = self.catalog_repo.find_active_service(pool, service_id).await?;
        let provider = self
            .catalog_repo
            .find_provider(pool, service.provider_id)
            .await?
            .ok_or(AppError::ServiceNotFound)?;

        let snapshot = self.load_day(pool, provider.id, date).await?;
        Ok(service_slot_view(&snapshot, &service, &provider, now))
    }

    // =========================================================================
    //  REGRAS SEMANAIS
    // =========================================================================

    pub async fn list_rules(&self, pool: &PgPool, provider_id: Uuid) -> Result<Vec<AvailabilityRule>, AppError> {
        self.availability_repo.list_rules(pool, provider_id).await
    }

    pub async fn create_rule(
        &self,
        pool: &PgPool,
        provider_id: Uuid,
        input: &CreateRuleRequest,
    ) -> Result<AvailabilityRule, AppError> {
        let rule = self
            .availability_repo
            .create_rule(pool, provider_id, input.day_of_week, input.start_time, input.end_time)
            .await?;

        tracing::info!(provider_id = %provider_id, rule_id = %rule.id, "Regra de disponibilidade criada");
        Ok(rule)
    }

    pub async fn update_rule(
        &self,
        pool: &PgPool,
        provider_id: Uuid,
        rule_id: Uuid,
        input: &UpdateRuleRequest,
    ) -> Result<AvailabilityRule, AppError> {
        let current = self.availability_repo.find_rule(pool, provider_id, rule_id).await?;

        // Mescla o que veio com o que já existe antes de validar a janela
        let start_time = input.start_time.unwrap_or(current.start_time);
        let end_time = input.end_time.unwrap_or(current.end_time);
        let is_active = input.is_active.unwrap_or(current.is_active);

        if !is_valid_rule_window(start_time, end_time) {
            let mut err = ValidationError::new("start_before_end");
            err.message = Some("O início deve ser anterior ao fim.".into());
            return Err(invalid_field("startTime", err));
        }

        self.availability_repo
            .update_rule(pool, provider_id, rule_id, start_time, end_time, is_active)
            .await
    }

    // =========================================================================
    //  EXCEÇÕES
    // =========================================================================

    pub async fn list_exceptions(
        &self,
        pool: &PgPool,
        provider_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AvailabilityException>, AppError> {
        let settings = self.availability_repo.get_settings(pool, provider_id).await?;
        let window = exception_range(&settings, from, to, now)?;
        self.availability_repo
            .list_exceptions_overlapping(pool, provider_id, window)
            .await
    }

    pub async fn create_exception(
        &self,
        pool: &PgPool,
        provider_id: Uuid,
        input: &CreateExceptionRequest,
    ) -> Result<AvailabilityException, AppError> {
        let exception_type = input
            .exception_type
            .as_deref()
            .unwrap_or(BLOCKED_EXCEPTION_TYPE);

        let exception = self
            .availability_repo
            .create_exception(
                pool,
                provider_id,
                Interval::new(input.start_time, input.end_time),
                exception_type,
                input.reason.as_deref(),
            )
            .await?;

        tracing::info!(
            provider_id = %provider_id,
            exception_id = %exception.id,
            exception_type = %exception.exception_type,
            "Exceção de disponibilidade criada"
        );
        Ok(exception)
    }

    pub async fn delete_exception(
        &self,
        pool: &PgPool,
        provider_id: Uuid,
        exception_id: Uuid,
    ) -> Result<(), AppError> {
        self.availability_repo
            .delete_exception(pool, provider_id, exception_id)
            .await
    }

    // =========================================================================
    //  CONFIGURAÇÕES
    // =========================================================================

    pub async fn get_settings(
        &self,
        pool: &PgPool,
        provider_id: Uuid,
    ) -> Result<ProviderAvailabilitySettings, AppError> {
        self.availability_repo.get_settings(pool, provider_id).await
    }

    pub async fn update_settings(
        &self,
        pool: &PgPool,
        provider_id: Uuid,
        input: &UpdateSettingsRequest,
    ) -> Result<ProviderAvailabilitySettings, AppError> {
        self.availability_repo.upsert_settings(pool, provider_id, input).await
    }
}

// ---
// Composições puras sobre a foto do dia
// ---

pub fn schedule_view(snapshot: &DaySnapshot, now: DateTime<Utc>) -> ScheduleResponse {
    let plan = generate_slots(snapshot, DISPLAY_SLOT_MINUTES, now);
    let display = Duration::minutes(DISPLAY_SLOT_MINUTES);

    ScheduleResponse {
        date: snapshot.day.date,
        timezone: snapshot.day.tz.name().to_string(),
        available_slots: plan
            .starts
            .iter()
            .map(|start| SlotView {
                start_time: *start,
                end_time: *start + display,
            })
            .collect(),
        bookings: plan.bookings.iter().map(ScheduleBooking::from).collect(),
        exceptions: plan.exceptions.iter().map(ScheduleException::from).collect(),
    }
}

pub fn service_slot_view(
    snapshot: &DaySnapshot,
    service: &ProviderService,
    provider: &Provider,
    now: DateTime<Utc>,
) -> ServiceSlotsResponse {
    let plan = generate_slots(snapshot, i64::from(service.duration_minutes), now);

    ServiceSlotsResponse {
        date: snapshot.day.date,
        timezone: snapshot.day.tz.name().to_string(),
        slots: plan.starts,
        service: ServiceSummary::from(service),
        provider: ProviderSummary::from(provider),
    }
}

// Período da listagem de exceções, em dias locais do prestador
fn exception_range(
    settings: &ProviderAvailabilitySettings,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<Interval, AppError> {
    let tz = timezone_or_utc(&settings.timezone);
    let from = from.unwrap_or_else(|| now.with_timezone(&tz).date_naive());
    let to = to.unwrap_or(from + Duration::days(DEFAULT_EXCEPTION_RANGE_DAYS));
    if to < from {
        return Err(AppError::InvalidDate(to.to_string()));
    }

    let first = LocalDay::new(from, tz)?;
    let last = LocalDay::new(to, tz)?;
    Ok(Interval::new(first.start_of_day, last.end_of_day))
}
