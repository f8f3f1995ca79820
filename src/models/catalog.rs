// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// Prestador (o profissional dono da agenda)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: Uuid,
    #[schema(ignore)]
    pub user_id: Uuid,
    #[schema(example = "Studio da Ana")]
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// ---
// Serviço oferecido pelo prestador (define a duração do horário)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderService {
    pub id: Uuid,
    pub provider_id: Uuid,
    #[schema(example = "Corte feminino")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 60)]
    pub duration_minutes: i32,
    #[schema(example = "80.00")]
    pub price: Decimal,
    #[schema(example = "Rua das Flores, 123")]
    pub location: Option<String>,
    pub is_active: bool,
}
