// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::document::DocumentStatus;
use crate::models::stock::LotStatus;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
// Os erros de domínio carregam os números que o chamador precisa mostrar
// (solicitado / disponível / produto), em vez de uma mensagem genérica.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Não encontrado (404) ---
    #[error("Armazém não encontrado: {0}")]
    WarehouseNotFound(Uuid),

    #[error("Posição de estoque não encontrada: {0}")]
    StockLocationNotFound(Uuid),

    #[error("Lote não encontrado: {0}")]
    LotNotFound(Uuid),

    #[error("Lote não encontrado com o número '{0}'")]
    LotNumberNotFound(String),

    #[error(
        "Saldo de estoque não encontrado para o produto {product_unit_id} \
         (armazém {warehouse_id}, posição {stock_location_id})"
    )]
    StockBalanceNotFound {
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    },

    #[error("Documento de estoque não encontrado: {0}")]
    DocumentNotFound(Uuid),

    #[error("Linha de documento não encontrada: {0}")]
    DocumentLineNotFound(Uuid),

    #[error("Transação de estoque não encontrada: {0}")]
    TransactionNotFound(Uuid),

    #[error("Contagem de inventário não encontrada: {0}")]
    StocktakingNotFound(Uuid),

    // --- Conflito (409) ---
    // Números de lote são identificadores globais: o mesmo número não pode
    // apontar para dois (produto, armazém, posição) diferentes.
    #[error(
        "O número de lote '{lot_number}' já está em uso por outro contexto \
         (produto {product_unit_id}, armazém {warehouse_id}, posição {stock_location_id})"
    )]
    LotNumberConflict {
        lot_number: String,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    },

    #[error(
        "Estoque insuficiente: solicitado {requested}, disponível {available} \
         (produto {product_unit_id})"
    )]
    InsufficientStock {
        requested: i32,
        available: i32,
        product_unit_id: Uuid,
    },

    // --- Estado inválido (409) ---
    #[error("Apenas documentos em rascunho podem ser alterados (status atual: {status:?})")]
    DocumentNotDraft { status: DocumentStatus },

    #[error("O lote '{lot_number}' não está ativo (status: {status:?})")]
    LotNotActive {
        lot_number: String,
        status: LotStatus,
    },

    #[error("Operação inválida: {0}")]
    InvalidState(String),

    // --- Quantidade inválida (400) ---
    // Cobre quantidade não positiva e underflow de reservado/físico.
    #[error("Quantidade inválida: {0}")]
    InvalidQuantity(String),

    // --- Infraestrutura (500) ---
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Falha ao serializar informação de reserva")]
    SerializationError(#[from] serde_json::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::WarehouseNotFound(_)
            | AppError::StockLocationNotFound(_)
            | AppError::LotNotFound(_)
            | AppError::LotNumberNotFound(_)
            | AppError::StockBalanceNotFound { .. }
            | AppError::DocumentNotFound(_)
            | AppError::DocumentLineNotFound(_)
            | AppError::TransactionNotFound(_)
            | AppError::StocktakingNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),

            AppError::LotNumberConflict { .. }
            | AppError::InsufficientStock { .. }
            | AppError::DocumentNotDraft { .. }
            | AppError::LotNotActive { .. }
            | AppError::InvalidState(_) => (StatusCode::CONFLICT, self.to_string()),

            AppError::InvalidQuantity(_) => (StatusCode::BAD_REQUEST, self.to_string()),

            // Todos os outros (DatabaseError, SerializationError, Internal) viram 500.
            // O `tracing` loga a mensagem detalhada; o cliente recebe algo genérico.
            e => {
                tracing::error!("Erro interno do servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
