// src/middleware/provider.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::catalog::Provider,
};

/// Perfil de prestador do usuário autenticado.
/// Rotas `/api/me/*` só fazem sentido para quem oferece serviços.
#[derive(Debug, Clone)]
pub struct CurrentProvider(pub Provider);

impl<S> FromRequestParts<S> for CurrentProvider
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        app_state
            .catalog_repo
            .find_provider_by_user(&app_state.db_pool, user.id)
            .await
            .map_err(|e| e.to_api_error(&locale))?
            .map(CurrentProvider)
            .ok_or_else(|| AppError::ProviderProfileRequired.to_api_error(&locale))
    }
}
