// src/models/availability.rs

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::calendar::parse_timezone;

// Único tipo de exceção que remove disponibilidade.
// Os demais tipos são exibidos, mas nunca consultados pelo gerador.
pub const BLOCKED_EXCEPTION_TYPE: &str = "blocked";

pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Janela válida de regra semanal. `end_time = 00:00` significa "até a meia-noite"
/// (fim do dia), já que `NaiveTime` não representa 24:00.
pub fn is_valid_rule_window(start_time: NaiveTime, end_time: NaiveTime) -> bool {
    start_time < end_time || (end_time == NaiveTime::MIN && start_time > NaiveTime::MIN)
}

// ---
// 1. Regra semanal (horário de trabalho recorrente)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRule {
    pub id: Uuid,
    #[schema(ignore)]
    pub provider_id: Uuid,
    /// 0 = domingo ... 6 = sábado
    #[schema(example = 1)]
    pub day_of_week: i16,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "17:00:00")]
    pub end_time: NaiveTime,
    // Regras nunca são apagadas, só desativadas (histórico)
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Exceção pontual (horário absoluto, em UTC)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityException {
    pub id: Uuid,
    #[schema(ignore)]
    pub provider_id: Uuid,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    #[serde(rename = "type")]
    #[schema(example = "blocked")]
    pub exception_type: String,
    #[schema(example = "Consulta médica")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityException {
    pub fn is_blocking(&self) -> bool {
        self.exception_type == BLOCKED_EXCEPTION_TYPE
    }
}

// ---
// 3. Configurações de agenda do prestador
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAvailabilitySettings {
    #[schema(ignore)]
    pub provider_id: Uuid,
    #[schema(example = 24)]
    pub min_lead_time_hours: i32,
    /// `null` = sem limite diário
    #[schema(example = 8)]
    pub max_bookings_per_day: Option<i32>,
    #[schema(example = "America/Sao_Paulo")]
    pub timezone: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProviderAvailabilitySettings {
    // Prestador sem linha de configuração: sem antecedência mínima e sem limite
    pub fn defaults(provider_id: Uuid) -> Self {
        Self {
            provider_id,
            min_lead_time_hours: 0,
            max_bookings_per_day: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
            updated_at: None,
        }
    }
}

// ---
// Payloads
// ---

fn validate_timezone(name: &str) -> Result<(), ValidationError> {
    parse_timezone(name).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("timezone");
        err.message = Some("Fuso horário IANA desconhecido.".into());
        err
    })
}

fn start_before_end_error() -> ValidationError {
    let mut err = ValidationError::new("start_before_end");
    err.message = Some("O início deve ser anterior ao fim.".into());
    err
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleRequest {
    #[validate(range(min = 0, max = 6, message = "O dia da semana deve estar entre 0 e 6."))]
    #[schema(example = 1)]
    pub day_of_week: i16,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "12:00:00")]
    pub end_time: NaiveTime,
}

impl CreateRuleRequest {
    pub fn validate_consistency(&self) -> Result<(), ValidationError> {
        if !is_valid_rule_window(self.start_time, self.end_time) {
            return Err(start_before_end_error());
        }
        Ok(())
    }
}

// Edição parcial; `isActive = false` é a forma de "remover" uma regra
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRuleRequest {
    #[schema(value_type = Option<String>, example = "14:00:00")]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:00:00")]
    pub end_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExceptionRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    // Se não vier, assume "blocked"
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 32, message = "O tipo deve ter entre 1 e 32 caracteres."))]
    #[schema(example = "blocked")]
    pub exception_type: Option<String>,

    #[validate(length(max = 500, message = "O motivo deve ter no máximo 500 caracteres."))]
    pub reason: Option<String>,
}

impl CreateExceptionRequest {
    pub fn validate_consistency(&self) -> Result<(), ValidationError> {
        if self.start_time >= self.end_time {
            return Err(start_before_end_error());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[validate(range(min = 0, max = 8760, message = "A antecedência mínima deve estar entre 0 e 8760 horas."))]
    #[serde(default)]
    #[schema(example = 24)]
    pub min_lead_time_hours: i32,

    #[validate(range(min = 1, message = "O limite diário deve ser pelo menos 1."))]
    #[schema(example = 8)]
    pub max_bookings_per_day: Option<i32>,

    #[validate(custom(function = "validate_timezone"))]
    #[serde(default = "default_timezone")]
    #[schema(example = "America/Sao_Paulo")]
    pub timezone: String,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
