//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod test_utils;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    // Agenda e disponibilidade do prestador logado
    let me_routes = Router::new()
        .route("/schedule", get(handlers::availability::get_schedule))
        .route("/availability/rules"
               ,get(handlers::availability::list_rules)
               .post(handlers::availability::create_rule)
        )
        .route("/availability/rules/{rule_id}"
               ,patch(handlers::availability::update_rule)
        )
        .route("/availability/exceptions"
               ,get(handlers::availability::list_exceptions)
               .post(handlers::availability::create_exception)
        )
        .route("/availability/exceptions/{exception_id}"
               ,axum::routing::delete(handlers::availability::delete_exception)
        )
        .route("/availability/settings"
               ,get(handlers::availability::get_settings)
               .put(handlers::availability::update_settings)
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let booking_routes = Router::new()
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings/{booking_id}/cancel", patch(handlers::bookings::cancel_booking))
        .route("/api/bookings/{booking_id}/confirm", patch(handlers::bookings::confirm_booking))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas públicas: o cliente consulta horários antes de fazer login
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .route("/api/services/{service_id}/slots", get(handlers::availability::get_service_slots))
        .nest("/api/me", me_routes)
        .merge(booking_routes)
        .with_state(app_state)
}
