// src/models/document.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- Tipo e Status do Documento ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Inbound,
    Outbound,
}

// Máquina de estados: DRAFT -> APPROVED ou DRAFT -> CANCELLED, sem volta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "document_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    Approved,
    Cancelled,
}

// --- Documento de Estoque ---
// Contêiner de linhas de uma direção (entrada ou saída) em um
// (armazém, posição). Nasce como rascunho; só movimenta estoque na aprovação.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockDocument {
    pub id: Uuid,
    pub document_type: DocumentType,
    pub status: DocumentStatus,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    pub reference_number: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl StockDocument {
    /// Transições e edições só são permitidas em rascunho.
    pub fn ensure_draft(&self) -> Result<(), AppError> {
        if self.status != DocumentStatus::Draft {
            return Err(AppError::DocumentNotDraft {
                status: self.status,
            });
        }
        Ok(())
    }
}

// --- Recibo de Reserva ---
// Registro imutável de quais lotes foram reservados (e quanto de cada um)
// no momento da reserva. A aprovação e o cancelamento consomem/liberam
// exatamente este recibo — nunca refazem a alocação FEFO, para não decidir
// sobre um estado de estoque que já mudou.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LotReservation {
    pub lot_id: Uuid,
    pub lot_number: String,
    pub reserved_quantity: i32,
}

pub fn encode_reservations(reservations: &[LotReservation]) -> Result<String, AppError> {
    Ok(serde_json::to_string(reservations)?)
}

pub fn decode_reservations(raw: &str) -> Result<Vec<LotReservation>, AppError> {
    Ok(serde_json::from_str(raw)?)
}

// --- Linha de Documento ---
// Os campos de lote são opcionais e só fazem sentido em documentos INBOUND.
// `reserved_lot_info` guarda o recibo de reserva serializado (JSON) para
// linhas OUTBOUND.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockDocumentLine {
    pub id: Uuid,
    pub document_id: Uuid,
    pub product_unit_id: Uuid,
    pub quantity: i32,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub supplier_name: Option<String>,
    pub supplier_batch_number: Option<String>,
    pub reserved_lot_info: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockDocumentLine {
    /// Desserializa o recibo de reserva gravado na linha, se houver.
    pub fn reservations(&self) -> Result<Option<Vec<LotReservation>>, AppError> {
        match &self.reserved_lot_info {
            Some(raw) => Ok(Some(decode_reservations(raw)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recibo_de_reserva_sobrevive_serializacao() {
        let receipt = vec![
            LotReservation {
                lot_id: Uuid::new_v4(),
                lot_number: "LOT-A".to_string(),
                reserved_quantity: 5,
            },
            LotReservation {
                lot_id: Uuid::new_v4(),
                lot_number: "LOT-B".to_string(),
                reserved_quantity: 3,
            },
        ];

        let raw = encode_reservations(&receipt).unwrap();
        let decoded = decode_reservations(&raw).unwrap();
        // A ordem das entradas é parte do recibo (ordem FEFO da alocação).
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn recibo_invalido_vira_erro_de_serializacao() {
        assert!(matches!(
            decode_reservations("não é json").unwrap_err(),
            AppError::SerializationError(_)
        ));
    }

    #[test]
    fn documento_fora_de_rascunho_nao_pode_ser_editado() {
        let mut doc = StockDocument {
            id: Uuid::new_v4(),
            document_type: DocumentType::Outbound,
            status: DocumentStatus::Draft,
            warehouse_id: Uuid::new_v4(),
            stock_location_id: Uuid::new_v4(),
            reference_number: None,
            note: None,
            created_at: Utc::now(),
            approved_at: None,
        };
        assert!(doc.ensure_draft().is_ok());

        doc.status = DocumentStatus::Approved;
        assert!(matches!(
            doc.ensure_draft().unwrap_err(),
            AppError::DocumentNotDraft {
                status: DocumentStatus::Approved
            }
        ));

        doc.status = DocumentStatus::Cancelled;
        assert!(doc.ensure_draft().is_err());
    }
}
