// src/services/stocktaking_service.rs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::StocktakingRepository,
    models::document::DocumentType,
    models::stocktaking::{Stocktaking, StocktakingDetail, StocktakingStatus},
    services::{
        balance_service::BalanceService,
        document_service::{DocumentService, NewDocumentLine},
        numbering::SharedNumberGenerator,
    },
};

// Conferência física de estoque. A reconciliação é expressa inteiramente nas
// primitivas do fluxo de documentos: sobra vira documento INBOUND aprovado,
// falta vira documento OUTBOUND aprovado — não existe caminho paralelo de
// mutação.
#[derive(Clone)]
pub struct StocktakingService {
    stocktaking_repo: StocktakingRepository,
    balance_service: BalanceService,
    document_service: DocumentService,
    numbers: SharedNumberGenerator,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StocktakingDetailPayload {
    pub product_unit_id: Uuid,
    /// Quantidade do sistema no momento da contagem; quando ausente, é lida
    /// do saldo atual.
    pub system_quantity: Option<i32>,
    #[validate(range(min = 0, message = "A quantidade contada não pode ser negativa."))]
    pub actual_quantity: i32,
    pub note: Option<String>,
}

impl StocktakingService {
    pub fn new(
        stocktaking_repo: StocktakingRepository,
        balance_service: BalanceService,
        document_service: DocumentService,
        numbers: SharedNumberGenerator,
    ) -> Self {
        Self {
            stocktaking_repo,
            balance_service,
            document_service,
            numbers,
        }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        stocktaking_date: Option<DateTime<Utc>>,
        note: Option<&str>,
    ) -> Result<Stocktaking, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let number = self.numbers.reference("ST");
        let stocktaking = self
            .stocktaking_repo
            .create(
                &mut *tx,
                &number,
                warehouse_id,
                stock_location_id,
                stocktaking_date.unwrap_or_else(Utc::now),
                note,
            )
            .await?;
        tx.commit().await?;

        tracing::info!("Contagem {} aberta", stocktaking.stocktaking_number);
        Ok(stocktaking)
    }

    /// Registra uma linha de contagem. A quantidade de sistema ausente é
    /// preenchida com o saldo atual do contexto.
    pub async fn add_detail<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
        payload: StocktakingDetailPayload,
    ) -> Result<StocktakingDetail, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let stocktaking = self
            .stocktaking_repo
            .find_by_id(&mut *tx, stocktaking_id)
            .await?
            .ok_or(AppError::StocktakingNotFound(stocktaking_id))?;
        Self::ensure_open(&stocktaking)?;

        let detail = self
            .insert_detail(&mut tx, &stocktaking, payload)
            .await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Confirma a contagem usando as linhas já registradas.
    pub async fn confirm<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
    ) -> Result<Stocktaking, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let stocktaking = self
            .stocktaking_repo
            .find_by_id_for_update(&mut *tx, stocktaking_id)
            .await?
            .ok_or(AppError::StocktakingNotFound(stocktaking_id))?;
        Self::ensure_open(&stocktaking)?;

        let details = self
            .stocktaking_repo
            .details_by_stocktaking(&mut *tx, stocktaking_id)
            .await?;
        if details.is_empty() {
            return Err(AppError::InvalidState(
                "não há linhas de contagem para confirmar".to_string(),
            ));
        }

        self.reconcile(&mut tx, &stocktaking, &details).await?;

        let confirmed = self
            .stocktaking_repo
            .update_status(
                &mut *tx,
                stocktaking_id,
                StocktakingStatus::Confirmed,
                Some(Utc::now()),
            )
            .await?;
        tx.commit().await?;

        tracing::info!("Contagem {} confirmada", confirmed.stocktaking_number);
        Ok(confirmed)
    }

    /// Confirma a contagem recebendo as linhas no próprio pedido (o chamador
    /// não registrou linha a linha antes).
    pub async fn confirm_with_payload<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
        payload: Vec<StocktakingDetailPayload>,
    ) -> Result<Stocktaking, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.is_empty() {
            return Err(AppError::InvalidState(
                "não há linhas de contagem para confirmar".to_string(),
            ));
        }

        let mut tx = executor.begin().await?;
        let stocktaking = self
            .stocktaking_repo
            .find_by_id_for_update(&mut *tx, stocktaking_id)
            .await?
            .ok_or(AppError::StocktakingNotFound(stocktaking_id))?;
        Self::ensure_open(&stocktaking)?;

        // Grava as linhas para ficar o histórico da contagem.
        let mut details = Vec::with_capacity(payload.len());
        for entry in payload {
            details.push(self.insert_detail(&mut tx, &stocktaking, entry).await?);
        }

        self.reconcile(&mut tx, &stocktaking, &details).await?;

        let confirmed = self
            .stocktaking_repo
            .update_status(
                &mut *tx,
                stocktaking_id,
                StocktakingStatus::Confirmed,
                Some(Utc::now()),
            )
            .await?;
        tx.commit().await?;

        tracing::info!("Contagem {} confirmada", confirmed.stocktaking_number);
        Ok(confirmed)
    }

    pub async fn cancel<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
    ) -> Result<Stocktaking, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let stocktaking = self
            .stocktaking_repo
            .find_by_id_for_update(&mut *tx, stocktaking_id)
            .await?
            .ok_or(AppError::StocktakingNotFound(stocktaking_id))?;
        Self::ensure_open(&stocktaking)?;

        let cancelled = self
            .stocktaking_repo
            .update_status(&mut *tx, stocktaking_id, StocktakingStatus::Cancelled, None)
            .await?;
        tx.commit().await?;
        Ok(cancelled)
    }

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
    ) -> Result<(Stocktaking, Vec<StocktakingDetail>), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let stocktaking = self
            .stocktaking_repo
            .find_by_id(&mut *conn, stocktaking_id)
            .await?
            .ok_or(AppError::StocktakingNotFound(stocktaking_id))?;
        let details = self
            .stocktaking_repo
            .details_by_stocktaking(&mut *conn, stocktaking_id)
            .await?;
        Ok((stocktaking, details))
    }

    pub async fn list_all(&self) -> Result<Vec<Stocktaking>, AppError> {
        self.stocktaking_repo.list_all().await
    }

    // ---
    // Internos
    // ---

    fn ensure_open(stocktaking: &Stocktaking) -> Result<(), AppError> {
        match stocktaking.status {
            StocktakingStatus::Pending | StocktakingStatus::InProgress => Ok(()),
            status => Err(AppError::InvalidState(format!(
                "a contagem {} não está aberta (status: {status:?})",
                stocktaking.stocktaking_number
            ))),
        }
    }

    async fn insert_detail(
        &self,
        conn: &mut PgConnection,
        stocktaking: &Stocktaking,
        payload: StocktakingDetailPayload,
    ) -> Result<StocktakingDetail, AppError> {
        if payload.actual_quantity < 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade contada não pode ser negativa (recebido {})",
                payload.actual_quantity
            )));
        }
        let system_quantity = match payload.system_quantity {
            Some(quantity) => quantity,
            None => {
                self.balance_service
                    .current_quantity(
                        &mut *conn,
                        payload.product_unit_id,
                        stocktaking.warehouse_id,
                        stocktaking.stock_location_id,
                    )
                    .await?
            }
        };
        self.stocktaking_repo
            .create_detail(
                &mut *conn,
                stocktaking.id,
                payload.product_unit_id,
                system_quantity,
                payload.actual_quantity,
                payload.note.as_deref(),
            )
            .await
    }

    /// Separa sobras e faltas e dispara os documentos de ajuste, cada um
    /// criado, preenchido e aprovado pelas primitivas normais do fluxo.
    async fn reconcile(
        &self,
        conn: &mut PgConnection,
        stocktaking: &Stocktaking,
        details: &[StocktakingDetail],
    ) -> Result<(), AppError> {
        let mut surplus = Vec::new();
        let mut shortage = Vec::new();
        for detail in details {
            let diff = detail.difference();
            if diff > 0 {
                surplus.push((detail, diff));
            } else if diff < 0 {
                shortage.push((detail, -diff));
            }
            // diff == 0: contagem bateu, nada a fazer.
        }

        if !surplus.is_empty() {
            let doc = self
                .document_service
                .create(
                    &mut *conn,
                    DocumentType::Inbound,
                    stocktaking.warehouse_id,
                    stocktaking.stock_location_id,
                    Some(&format!("{}-IN", stocktaking.stocktaking_number)),
                    Some(&format!(
                        "Entrada de ajuste da contagem {}",
                        stocktaking.stocktaking_number
                    )),
                )
                .await?;
            let lines = surplus
                .iter()
                .map(|(detail, diff)| NewDocumentLine {
                    product_unit_id: detail.product_unit_id,
                    quantity: *diff,
                    // Lote próprio do ajuste; o número carrega a contagem e
                    // o produto para rastreio.
                    lot_number: Some(format!(
                        "{}-{}",
                        stocktaking.stocktaking_number, detail.product_unit_id
                    )),
                    expiry_date: None,
                    manufacturing_date: None,
                    supplier_name: Some("Ajuste de inventário".to_string()),
                    supplier_batch_number: None,
                })
                .collect();
            self.document_service
                .add_lines_bulk(&mut *conn, doc.id, lines)
                .await?;
            self.document_service.approve(&mut *conn, doc.id).await?;
        }

        if !shortage.is_empty() {
            let doc = self
                .document_service
                .create(
                    &mut *conn,
                    DocumentType::Outbound,
                    stocktaking.warehouse_id,
                    stocktaking.stock_location_id,
                    Some(&format!("{}-OUT", stocktaking.stocktaking_number)),
                    Some(&format!(
                        "Saída de ajuste da contagem {}",
                        stocktaking.stocktaking_number
                    )),
                )
                .await?;
            let lines = shortage
                .iter()
                .map(|(detail, diff)| NewDocumentLine {
                    product_unit_id: detail.product_unit_id,
                    quantity: *diff,
                    lot_number: None,
                    expiry_date: None,
                    manufacturing_date: None,
                    supplier_name: None,
                    supplier_batch_number: None,
                })
                .collect();
            self.document_service
                .add_lines_bulk(&mut *conn, doc.id, lines)
                .await?;
            self.document_service.approve(&mut *conn, doc.id).await?;
        }

        Ok(())
    }
}
