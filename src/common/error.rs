// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Erros internos da aplicação (domínio + infraestrutura).
// Os handlers convertem para ApiError com `to_api_error`, já no idioma do cliente.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Data inválida: {0}")]
    InvalidDate(String),

    #[error("Fuso horário inválido: {0}")]
    InvalidTimezone(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não possui perfil de prestador")]
    ProviderProfileRequired,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Serviço não encontrado")]
    ServiceNotFound,

    #[error("Agendamento não encontrado")]
    BookingNotFound,

    #[error("Regra de disponibilidade não encontrada")]
    RuleNotFound,

    #[error("Exceção de disponibilidade não encontrada")]
    ExceptionNotFound,

    // O gerador de horários é apenas consultivo: este é o erro "esperado"
    // quando outro cliente confirmou o mesmo horário antes.
    #[error("Horário não está mais disponível")]
    SlotUnavailable,

    #[error("Horário fora da disponibilidade do prestador")]
    SlotOutsideAvailability,

    #[error("Transição de status inválida")]
    InvalidStatusTransition,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

// O formato de erro que vai para o cliente HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            code,
            error: error.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "code": self.code,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn to_api_error(self, locale: &Locale) -> ApiError {
        let pt = locale.is_portuguese();
        // Escolhe a mensagem conforme o idioma do cliente
        let msg = |pt_msg: &str, en_msg: &str| if pt { pt_msg.to_string() } else { en_msg.to_string() };

        match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    code: "VALIDATION_ERROR",
                    error: msg("Um ou mais campos são inválidos.", "One or more fields are invalid."),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::InvalidDate(raw) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_DATE",
                if pt {
                    format!("Data inválida '{}'. Use o formato AAAA-MM-DD.", raw)
                } else {
                    format!("Invalid date '{}'. Expected YYYY-MM-DD.", raw)
                },
            ),
            AppError::InvalidTimezone(raw) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INVALID_TIMEZONE",
                if pt {
                    format!("Fuso horário desconhecido '{}'.", raw)
                } else {
                    format!("Unknown time zone '{}'.", raw)
                },
            ),
            AppError::InvalidToken => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                msg("Token de autenticação inválido ou ausente.", "Missing or invalid authentication token."),
            ),
            AppError::ProviderProfileRequired => ApiError::new(
                StatusCode::FORBIDDEN,
                "PROVIDER_REQUIRED",
                msg("Esta ação exige um perfil de prestador ativo.", "This action requires an active provider profile."),
            ),
            AppError::Forbidden => ApiError::new(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                msg("Você não tem acesso a este recurso.", "You do not have access to this resource."),
            ),
            AppError::ServiceNotFound => ApiError::new(
                StatusCode::NOT_FOUND,
                "SERVICE_NOT_FOUND",
                msg("Serviço não encontrado ou inativo.", "Service not found or inactive."),
            ),
            AppError::BookingNotFound => ApiError::new(
                StatusCode::NOT_FOUND,
                "BOOKING_NOT_FOUND",
                msg("Agendamento não encontrado.", "Booking not found."),
            ),
            AppError::RuleNotFound => ApiError::new(
                StatusCode::NOT_FOUND,
                "RULE_NOT_FOUND",
                msg("Regra de disponibilidade não encontrada.", "Availability rule not found."),
            ),
            AppError::ExceptionNotFound => ApiError::new(
                StatusCode::NOT_FOUND,
                "EXCEPTION_NOT_FOUND",
                msg("Exceção de disponibilidade não encontrada.", "Availability exception not found."),
            ),
            AppError::SlotUnavailable => ApiError::new(
                StatusCode::CONFLICT,
                "SLOT_UNAVAILABLE",
                msg(
                    "Este horário não está mais disponível. Consulte os horários novamente.",
                    "This slot is no longer available. Please query the slots again.",
                ),
            ),
            AppError::SlotOutsideAvailability => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "SLOT_OUTSIDE_AVAILABILITY",
                msg(
                    "O horário escolhido está fora da disponibilidade do prestador.",
                    "The chosen time is outside the provider's availability.",
                ),
            ),
            AppError::InvalidStatusTransition => ApiError::new(
                StatusCode::CONFLICT,
                "INVALID_STATUS_TRANSITION",
                msg("O agendamento não pode mudar para este status.", "The booking cannot move to this status."),
            ),
            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O detalhe vai só para o log, nunca para o cliente.
            ref e @ (AppError::DatabaseError(_) | AppError::InternalServerError(_)) => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    msg("Ocorreu um erro inesperado.", "An unexpected error occurred."),
                )
            }
        }
    }
}

// Erro de validação de um único campo (regras que o derive não cobre)
pub fn invalid_field(field: &'static str, error: validator::ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);
    AppError::ValidationError(errors)
}

// Usado pelos middlewares, que não têm acesso ao idioma do cliente.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn slot_unavailable_is_a_conflict() {
        let api = AppError::SlotUnavailable.to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.code, "SLOT_UNAVAILABLE");
        assert!(api.error.contains("no longer available"));
    }

    #[test]
    fn messages_follow_the_locale() {
        let api = AppError::ServiceNotFound.to_api_error(&pt());
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.error, "Serviço não encontrado ou inativo.");
    }

    #[test]
    fn invalid_date_is_a_client_error() {
        let api = AppError::InvalidDate("2024-13-01".into()).to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.error.contains("2024-13-01"));
    }

    #[test]
    fn validation_errors_are_listed_per_field() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("range");
        err.message = Some("dayOfWeek must be between 0 and 6".into());
        errors.add("dayOfWeek", err);

        let api = AppError::ValidationError(errors).to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["dayOfWeek"][0], "dayOfWeek must be between 0 and 6");
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let api = AppError::InternalServerError(anyhow::anyhow!("pool exploded"))
            .to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("pool exploded"));
    }
}
