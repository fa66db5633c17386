// src/services/inventory_service.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{TransactionRepository, WarehouseRepository},
    models::stock::{StockTransaction, TransactionType},
    services::{balance_service::BalanceService, lot_service::LotService},
};

// API de transações de estoque: a fachada fina sobre o razão de lotes e o
// saldo agregado. Toda entrada passa pelo upsert de lote e toda saída pela
// baixa FEFO — lotes e saldo nunca andam separados.
#[derive(Clone)]
pub struct InventoryService {
    transaction_repo: TransactionRepository,
    warehouse_repo: WarehouseRepository,
    lot_service: LotService,
    balance_service: BalanceService,
}

// ---
// Requests (desserializados direto dos handlers)
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InboundStockRequest {
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    pub transaction_date: Option<DateTime<Utc>>,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub supplier_name: Option<String>,
    pub supplier_batch_number: Option<String>,
    pub note: Option<String>,
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutboundStockRequest {
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    pub transaction_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub product_unit_id: Uuid,
    pub source_warehouse_id: Uuid,
    pub source_stock_location_id: Uuid,
    pub destination_warehouse_id: Uuid,
    pub destination_stock_location_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    pub transaction_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    #[validate(range(min = 0, message = "A quantidade contada não pode ser negativa."))]
    pub new_quantity: i32,
    pub reason: Option<String>,
    pub adjustment_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub transaction_type: TransactionType,
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    #[validate(range(min = 0, message = "A quantidade não pode ser negativa."))]
    pub quantity: i32,
    pub transaction_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub reference_number: Option<String>,
}

impl InventoryService {
    pub fn new(
        transaction_repo: TransactionRepository,
        warehouse_repo: WarehouseRepository,
        lot_service: LotService,
        balance_service: BalanceService,
    ) -> Self {
        Self {
            transaction_repo,
            warehouse_repo,
            lot_service,
            balance_service,
        }
    }

    /// Entrada genérica da API: despacha para o fluxo certo de acordo com o
    /// tipo, de modo que nenhum caminho mexa no saldo sem o espelho nos lotes.
    pub async fn create_transaction<'e, E>(
        &self,
        executor: E,
        request: CreateTransactionRequest,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        match request.transaction_type {
            TransactionType::Import => {
                self.process_inbound(
                    executor,
                    InboundStockRequest {
                        product_unit_id: request.product_unit_id,
                        warehouse_id: request.warehouse_id,
                        stock_location_id: request.stock_location_id,
                        quantity: request.quantity,
                        transaction_date: request.transaction_date,
                        lot_number: None,
                        expiry_date: None,
                        manufacturing_date: None,
                        supplier_name: None,
                        supplier_batch_number: None,
                        note: request.note,
                        reference_number: request.reference_number,
                    },
                )
                .await
            }
            TransactionType::Export => {
                self.process_outbound_with_fefo(
                    executor,
                    OutboundStockRequest {
                        product_unit_id: request.product_unit_id,
                        warehouse_id: request.warehouse_id,
                        stock_location_id: request.stock_location_id,
                        quantity: request.quantity,
                        transaction_date: request.transaction_date,
                        note: request.note,
                        reference_number: request.reference_number,
                    },
                )
                .await
            }
            TransactionType::Adjust => {
                self.process_adjustment(
                    executor,
                    AdjustmentRequest {
                        product_unit_id: request.product_unit_id,
                        warehouse_id: request.warehouse_id,
                        stock_location_id: request.stock_location_id,
                        new_quantity: request.quantity,
                        reason: None,
                        adjustment_date: request.transaction_date,
                        note: request.note,
                        reference_number: request.reference_number,
                    },
                )
                .await
            }
            TransactionType::Transfer => Err(AppError::InvalidState(
                "transferências devem usar o endpoint de transferência (origem + destino)"
                    .to_string(),
            )),
        }
    }

    /// Entrada de estoque: upsert do lote + registro IMPORT + saldo,
    /// tudo na mesma transação.
    pub async fn process_inbound<'e, E>(
        &self,
        executor: E,
        request: InboundStockRequest,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.validate_context(&mut tx, request.warehouse_id, request.stock_location_id)
            .await?;

        self.lot_service
            .upsert_on_inbound(
                &mut *tx,
                request.product_unit_id,
                request.warehouse_id,
                request.stock_location_id,
                request.quantity,
                request.lot_number.as_deref(),
                request.expiry_date,
                request.manufacturing_date,
                request.supplier_name.as_deref(),
                request.supplier_batch_number.as_deref(),
                request.note.as_deref(),
            )
            .await?;

        let transaction = self
            .transaction_repo
            .create(
                &mut *tx,
                TransactionType::Import,
                request.product_unit_id,
                request.warehouse_id,
                request.stock_location_id,
                request.quantity,
                request.transaction_date.unwrap_or_else(Utc::now),
                request.note.as_deref(),
                request.reference_number.as_deref(),
            )
            .await?;

        self.balance_service
            .apply_transaction(&mut *tx, &transaction)
            .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    /// Entrada em massa: uma transação para o grupo inteiro — ou todas as
    /// linhas entram, ou nenhuma.
    pub async fn process_bulk_inbound<'e, E>(
        &self,
        executor: E,
        requests: Vec<InboundStockRequest>,
    ) -> Result<Vec<StockTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut created = Vec::with_capacity(requests.len());
        for request in requests {
            created.push(self.process_inbound(&mut *tx, request).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Saída com FEFO: baixa os lotes que vencem primeiro + registro EXPORT
    /// + saldo. A suficiência é confirmada nos dois lados (lotes e agregado).
    pub async fn process_outbound_with_fefo<'e, E>(
        &self,
        executor: E,
        request: OutboundStockRequest,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.validate_context(&mut tx, request.warehouse_id, request.stock_location_id)
            .await?;

        self.lot_service
            .withdraw_fefo(
                &mut *tx,
                request.product_unit_id,
                request.warehouse_id,
                request.stock_location_id,
                request.quantity,
            )
            .await?;

        let transaction = self
            .transaction_repo
            .create(
                &mut *tx,
                TransactionType::Export,
                request.product_unit_id,
                request.warehouse_id,
                request.stock_location_id,
                request.quantity,
                request.transaction_date.unwrap_or_else(Utc::now),
                request.note.as_deref(),
                request.reference_number.as_deref(),
            )
            .await?;

        self.balance_service
            .apply_transaction(&mut *tx, &transaction)
            .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    /// Saída em massa: valida TODAS as linhas antes de baixar qualquer uma,
    /// e aplica tudo dentro de uma única transação.
    pub async fn process_bulk_outbound<'e, E>(
        &self,
        executor: E,
        requests: Vec<OutboundStockRequest>,
    ) -> Result<Vec<StockTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Passo 1: valida a disponibilidade de cada linha (soma dos lotes).
        for request in &requests {
            let lots = self
                .lot_service
                .available_lots_scoped(
                    &mut *tx,
                    request.product_unit_id,
                    Some(request.warehouse_id),
                    Some(request.stock_location_id),
                )
                .await?;
            let total_available: i32 = lots.iter().map(|l| l.available_quantity).sum();
            if total_available < request.quantity {
                return Err(AppError::InsufficientStock {
                    requested: request.quantity,
                    available: total_available,
                    product_unit_id: request.product_unit_id,
                });
            }
        }

        // Passo 2: aplica. A checagem autoritativa se repete com as linhas
        // travadas dentro de cada baixa.
        let mut created = Vec::with_capacity(requests.len());
        for request in requests {
            created.push(self.process_outbound_with_fefo(&mut *tx, request).await?);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Transferência: saída FEFO na origem + entrada no destino, em uma
    /// transação só. O lote de destino é gerado automaticamente.
    pub async fn process_transfer<'e, E>(
        &self,
        executor: E,
        request: TransferRequest,
    ) -> Result<(StockTransaction, StockTransaction), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let note = request.note.clone().unwrap_or_default();

        let export = self
            .process_outbound_with_fefo(
                &mut *tx,
                OutboundStockRequest {
                    product_unit_id: request.product_unit_id,
                    warehouse_id: request.source_warehouse_id,
                    stock_location_id: request.source_stock_location_id,
                    quantity: request.quantity,
                    transaction_date: request.transaction_date,
                    note: Some(format!("Saída por transferência: {note}")),
                    reference_number: request.reference_number.clone(),
                },
            )
            .await?;

        let import = self
            .process_inbound(
                &mut *tx,
                InboundStockRequest {
                    product_unit_id: request.product_unit_id,
                    warehouse_id: request.destination_warehouse_id,
                    stock_location_id: request.destination_stock_location_id,
                    quantity: request.quantity,
                    transaction_date: request.transaction_date,
                    lot_number: None,
                    expiry_date: None,
                    manufacturing_date: None,
                    supplier_name: None,
                    supplier_batch_number: None,
                    note: Some(format!("Entrada por transferência: {note}")),
                    reference_number: request.reference_number,
                },
            )
            .await?;

        tx.commit().await?;
        Ok((export, import))
    }

    /// Ajuste de contagem: registra ADJUST e grava o valor absoluto no saldo.
    pub async fn process_adjustment<'e, E>(
        &self,
        executor: E,
        request: AdjustmentRequest,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.validate_context(&mut tx, request.warehouse_id, request.stock_location_id)
            .await?;

        let note = match (&request.reason, &request.note) {
            (Some(reason), Some(note)) => Some(format!("{reason}: {note}")),
            (Some(reason), None) => Some(reason.clone()),
            (None, note) => note.clone(),
        };

        let transaction = self
            .transaction_repo
            .create(
                &mut *tx,
                TransactionType::Adjust,
                request.product_unit_id,
                request.warehouse_id,
                request.stock_location_id,
                request.new_quantity,
                request.adjustment_date.unwrap_or_else(Utc::now),
                note.as_deref(),
                request.reference_number.as_deref(),
            )
            .await?;

        self.balance_service
            .apply_transaction(&mut *tx, &transaction)
            .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    /// Aceite de saída: carimbo de aprovação na nota da transação EXPORT
    /// (passo de conferência distinto da aprovação de documentos).
    pub async fn accept_outbound<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
        note: Option<&str>,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let transaction = self
            .transaction_repo
            .find_by_id(&mut *tx, transaction_id)
            .await?
            .ok_or(AppError::TransactionNotFound(transaction_id))?;

        if transaction.transaction_type != TransactionType::Export {
            return Err(AppError::InvalidState(
                "apenas transações EXPORT podem ser aceitas".to_string(),
            ));
        }

        let stamped = match note.filter(|n| !n.trim().is_empty()) {
            Some(n) => match &transaction.note {
                Some(existing) => format!("{existing} | Aceito: {}", n.trim()),
                None => format!("Aceito: {}", n.trim()),
            },
            None => transaction.note.clone().unwrap_or_default(),
        };

        let updated = self
            .transaction_repo
            .update_note(&mut *tx, transaction_id, Some(&stamped))
            .await?;
        tx.commit().await?;

        tracing::info!("Saída {} aceita", transaction_id);
        Ok(updated)
    }

    /// Aceite em massa: todas as transações aceitas ou nenhuma.
    pub async fn accept_bulk_outbound<'e, E>(
        &self,
        executor: E,
        transaction_ids: Vec<Uuid>,
        note: Option<&str>,
    ) -> Result<Vec<StockTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut accepted = Vec::with_capacity(transaction_ids.len());
        for id in transaction_ids {
            accepted.push(self.accept_outbound(&mut *tx, id, note).await?);
        }
        tx.commit().await?;
        Ok(accepted)
    }

    /// Apaga uma transação aplicando o delta inverso no saldo (a trilha de
    /// auditoria manda; os lotes não são recalculados).
    pub async fn delete_transaction<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let transaction = self
            .transaction_repo
            .find_by_id(&mut *tx, transaction_id)
            .await?
            .ok_or(AppError::TransactionNotFound(transaction_id))?;

        self.balance_service
            .reverse_transaction(&mut *tx, &transaction)
            .await?;
        self.transaction_repo
            .delete(&mut *tx, transaction_id)
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Transação {} removida (delta inverso aplicado)",
            transaction_id
        );
        Ok(())
    }

    pub async fn get_transaction<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.transaction_repo
            .find_by_id(executor, transaction_id)
            .await?
            .ok_or(AppError::TransactionNotFound(transaction_id))
    }

    pub async fn list_transactions(
        &self,
        transaction_type: Option<TransactionType>,
        warehouse_id: Option<Uuid>,
        stock_location_id: Option<Uuid>,
    ) -> Result<Vec<StockTransaction>, AppError> {
        self.transaction_repo
            .list(transaction_type, warehouse_id, stock_location_id)
            .await
    }

    pub fn lot_service(&self) -> &LotService {
        &self.lot_service
    }

    /// Registra no razão a saída de uma linha de documento aprovada. O saldo
    /// e os lotes já foram baixados pelo consumo do recibo; aqui entra só a
    /// linha de auditoria EXPORT.
    pub async fn record_export_for_document(
        &self,
        conn: &mut PgConnection,
        document: &crate::models::document::StockDocument,
        line: &crate::models::document::StockDocumentLine,
    ) -> Result<StockTransaction, AppError> {
        self.transaction_repo
            .create(
                &mut *conn,
                TransactionType::Export,
                line.product_unit_id,
                document.warehouse_id,
                document.stock_location_id,
                line.quantity,
                Utc::now(),
                Some(&format!("Do documento {}", document.id)),
                document.reference_number.as_deref(),
            )
            .await
    }

    /// Armazém e posição precisam existir, e a posição pertencer ao armazém.
    async fn validate_context(
        &self,
        conn: &mut PgConnection,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<(), AppError> {
        self.warehouse_repo
            .find_warehouse(&mut *conn, warehouse_id)
            .await?
            .ok_or(AppError::WarehouseNotFound(warehouse_id))?;
        let location = self
            .warehouse_repo
            .find_location(&mut *conn, stock_location_id)
            .await?
            .ok_or(AppError::StockLocationNotFound(stock_location_id))?;
        if location.warehouse_id != warehouse_id {
            return Err(AppError::InvalidState(format!(
                "a posição {stock_location_id} não pertence ao armazém {warehouse_id}"
            )));
        }
        Ok(())
    }
}
