// src/models/stocktaking.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stocktaking_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StocktakingStatus {
    Pending,
    InProgress,
    Confirmed,
    Cancelled,
}

// --- Contagem de Inventário ---
// Sessão de conferência física de um (armazém, posição). A confirmação não
// mexe no estoque diretamente: gera documentos de entrada/saída aprovados
// pelas mesmas primitivas do fluxo normal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stocktaking {
    pub id: Uuid,
    pub stocktaking_number: String,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    pub status: StocktakingStatus,
    pub stocktaking_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// Uma linha por produto contado: quantidade do sistema vs quantidade real.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StocktakingDetail {
    pub id: Uuid,
    pub stocktaking_id: Uuid,
    pub product_unit_id: Uuid,
    pub system_quantity: i32,
    pub actual_quantity: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StocktakingDetail {
    /// Diferença contada: positiva = sobra (entrada), negativa = falta (saída).
    pub fn difference(&self) -> i32 {
        self.actual_quantity - self.system_quantity
    }
}
