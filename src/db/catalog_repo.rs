// src/db/catalog_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Provider, ProviderService},
};

// Prestadores e serviços: só leitura aqui (o cadastro é de outro módulo)
#[derive(Clone, Default)]
pub struct CatalogRepository;

impl CatalogRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_provider_by_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Option<Provider>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let provider = sqlx::query_as::<_, Provider>(
            "SELECT * FROM providers WHERE user_id = $1 AND is_active = TRUE",
        )
            .bind(user_id)
            .fetch_optional(executor)
            .await?;

        Ok(provider)
    }

    pub async fn find_provider<'e, E>(
        &self,
        executor: E,
        provider_id: Uuid,
    ) -> Result<Option<Provider>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let provider = sqlx::query_as::<_, Provider>(
            "SELECT * FROM providers WHERE id = $1 AND is_active = TRUE",
        )
            .bind(provider_id)
            .fetch_optional(executor)
            .await?;

        Ok(provider)
    }

    // Serviço ativo de um prestador ativo; qualquer outra coisa é "não encontrado"
    pub async fn find_active_service<'e, E>(
        &self,
        executor: E,
        service_id: Uuid,
    ) -> Result<ProviderService, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ProviderService>(
            r#"
            SELECT s.id, s.provider_id, s.name, s.description, s.duration_minutes,
                   s.price, s.location, s.is_active
            FROM services s
            JOIN providers p ON p.id = s.provider_id
            WHERE s.id = $1 AND s.is_active = TRUE AND p.is_active = TRUE
            "#,
        )
            .bind(service_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::ServiceNotFound)
    }
}
