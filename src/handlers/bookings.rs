// src/handlers/bookings.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, provider::CurrentProvider},
    models::booking::{Booking, CreateBookingRequest},
};

// POST /api/bookings
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Agendamento criado como pendente", body = Booking),
        (status = 404, description = "Serviço não encontrado ou inativo"),
        (status = 409, description = "Horário não está mais disponível"),
        (status = 422, description = "Horário fora da disponibilidade do prestador")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let booking = app_state
        .booking_service
        .create_booking(user.id, &payload, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// PATCH /api/bookings/{id}/cancel
#[utoipa::path(
    patch,
    path = "/api/bookings/{booking_id}/cancel",
    tag = "Bookings",
    params(("booking_id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento cancelado", body = Booking),
        (status = 403, description = "Nem cliente nem prestador do agendamento"),
        (status = 409, description = "Agendamento já encerrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .cancel_booking(user.id, booking_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(booking)))
}

// PATCH /api/bookings/{id}/confirm
#[utoipa::path(
    patch,
    path = "/api/bookings/{booking_id}/confirm",
    tag = "Bookings",
    params(("booking_id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento confirmado", body = Booking),
        (status = 404, description = "Agendamento não encontrado"),
        (status = 409, description = "Só agendamentos pendentes podem ser confirmados")
    ),
    security(("api_jwt" = []))
)]
pub async fn confirm_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    CurrentProvider(provider): CurrentProvider,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = app_state
        .booking_service
        .confirm_booking(&provider, booking_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(booking)))
}
