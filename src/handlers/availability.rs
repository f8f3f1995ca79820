// src/handlers/availability.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        calendar::parse_date,
        error::{invalid_field, ApiError, AppError},
    },
    config::AppState,
    middleware::{i18n::Locale, provider::CurrentProvider},
    models::{
        availability::{
            AvailabilityException, AvailabilityRule, CreateExceptionRequest, CreateRuleRequest,
            ProviderAvailabilitySettings, UpdateRuleRequest, UpdateSettingsRequest,
        },
        schedule::{ScheduleResponse, ServiceSlotsResponse},
    },
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct DateQuery {
    /// Data local do prestador (AAAA-MM-DD)
    #[param(required = true, example = "2030-01-07")]
    pub date: Option<String>,
}

impl DateQuery {
    // Ausente ou malformada: os dois casos viram INVALID_DATE
    fn parse(&self) -> Result<NaiveDate, AppError> {
        match self.date.as_deref() {
            Some(raw) => parse_date(raw),
            None => Err(AppError::InvalidDate(String::new())),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExceptionRangeQuery {
    #[param(example = "2030-01-01")]
    pub from: Option<String>,
    #[param(example = "2030-01-31")]
    pub to: Option<String>,
}

// =============================================================================
//  1. CONSULTAS DE HORÁRIOS
// =============================================================================

// GET /api/me/schedule?date=
#[utoipa::path(
    get,
    path = "/api/me/schedule",
    tag = "Schedule",
    params(DateQuery),
    responses(
        (status = 200, description = "Agenda do dia: horários livres, agendamentos e bloqueios", body = ScheduleResponse),
        (status = 400, description = "Data inválida"),
        (status = 403, description = "Usuário sem perfil de prestador")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = query.parse().map_err(|e| e.to_api_error(&locale))?;

    let schedule = app_state
        .availability_service
        .provider_schedule(&app_state.db_pool, &provider, date, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(schedule)))
}

// GET /api/services/{service_id}/slots?date=
// Pública: o cliente escolhe um horário antes de fazer login
#[utoipa::path(
    get,
    path = "/api/services/{service_id}/slots",
    tag = "Schedule",
    params(
        ("service_id" = Uuid, Path, description = "ID do serviço"),
        DateQuery
    ),
    responses(
        (status = 200, description = "Horários de início disponíveis", body = ServiceSlotsResponse),
        (status = 400, description = "Data inválida"),
        (status = 404, description = "Serviço não encontrado ou inativo")
    )
)]
pub async fn get_service_slots(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(service_id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = query.parse().map_err(|e| e.to_api_error(&locale))?;

    let slots = app_state
        .availability_service
        .service_slots(&app_state.db_pool, service_id, date, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(slots)))
}

// =============================================================================
//  2. REGRAS SEMANAIS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/me/availability/rules",
    tag = "Availability",
    responses(
        (status = 200, description = "Regras semanais do prestador", body = Vec<AvailabilityRule>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_rules(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
) -> Result<impl IntoResponse, ApiError> {
    let rules = app_state
        .availability_service
        .list_rules(&app_state.db_pool, provider.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(rules)))
}

#[utoipa::path(
    post,
    path = "/api/me/availability/rules",
    tag = "Availability",
    request_body = CreateRuleRequest,
    responses(
        (status = 201, description = "Regra criada", body = AvailabilityRule),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_rule(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
    Json(payload): Json<CreateRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;
    payload
        .validate_consistency()
        .map_err(|e| invalid_field("endTime", e).to_api_error(&locale))?;

    let rule = app_state
        .availability_service
        .create_rule(&app_state.db_pool, provider.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(rule)))
}

#[utoipa::path(
    patch,
    path = "/api/me/availability/rules/{rule_id}",
    tag = "Availability",
    request_body = UpdateRuleRequest,
    params(("rule_id" = Uuid, Path, description = "ID da regra")),
    responses(
        (status = 200, description = "Regra atualizada", body = AvailabilityRule),
        (status = 404, description = "Regra não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_rule(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
    Path(rule_id): Path<Uuid>,
    Json(payload): Json<UpdateRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = app_state
        .availability_service
        .update_rule(&app_state.db_pool, provider.id, rule_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(rule)))
}

// =============================================================================
//  3. EXCEÇÕES (bloqueios pontuais)
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/me/availability/exceptions",
    tag = "Availability",
    params(ExceptionRangeQuery),
    responses(
        (status = 200, description = "Exceções que tocam o período", body = Vec<AvailabilityException>),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_exceptions(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
    Query(query): Query<ExceptionRangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let from = query
        .from
        .as_deref()
        .map(parse_date)
        .transpose()
        .map_err(|e| e.to_api_error(&locale))?;
    let to = query
        .to
        .as_deref()
        .map(parse_date)
        .transpose()
        .map_err(|e| e.to_api_error(&locale))?;

    let exceptions = app_state
        .availability_service
        .list_exceptions(&app_state.db_pool, provider.id, from, to, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(exceptions)))
}

#[utoipa::path(
    post,
    path = "/api/me/availability/exceptions",
    tag = "Availability",
    request_body = CreateExceptionRequest,
    responses(
        (status = 201, description = "Exceção criada", body = AvailabilityException),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_exception(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
    Json(payload): Json<CreateExceptionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;
    payload
        .validate_consistency()
        .map_err(|e| invalid_field("endTime", e).to_api_error(&locale))?;

    let exception = app_state
        .availability_service
        .create_exception(&app_state.db_pool, provider.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(exception)))
}

#[utoipa::path(
    delete,
    path = "/api/me/availability/exceptions/{exception_id}",
    tag = "Availability",
    params(("exception_id" = Uuid, Path, description = "ID da exceção")),
    responses(
        (status = 204, description = "Exceção removida"),
        (status = 404, description = "Exceção não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_exception(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
    Path(exception_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .availability_service
        .delete_exception(&app_state.db_pool, provider.id, exception_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  4. CONFIGURAÇÕES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/me/availability/settings",
    tag = "Availability",
    responses(
        (status = 200, description = "Configurações (ou os valores padrão)", body = ProviderAvailabilitySettings)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
) -> Result<impl IntoResponse, ApiError> {
    let settings = app_state
        .availability_service
        .get_settings(&app_state.db_pool, provider.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(settings)))
}

#[utoipa::path(
    put,
    path = "/api/me/availability/settings",
    tag = "Availability",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Configurações salvas", body = ProviderAvailabilitySettings),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let settings = app_state
        .availability_service
        .update_settings(&app_state.db_pool, provider.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(settings)))
}
