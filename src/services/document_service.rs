// src/services/document_service.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{DocumentRepository, WarehouseRepository},
    models::document::{
        encode_reservations, DocumentStatus, DocumentType, StockDocument, StockDocumentLine,
    },
    services::{
        inventory_service::{InboundStockRequest, InventoryService},
        reservation_service::ReservationService,
    },
};

// Fluxo de documentos: DRAFT -> APPROVED ou DRAFT -> CANCELLED, sem volta.
// A reserva acontece ao adicionar a linha (OUTBOUND); a movimentação física
// só acontece na aprovação — guiada pelo recibo gravado na linha.
#[derive(Clone)]
pub struct DocumentService {
    document_repo: DocumentRepository,
    warehouse_repo: WarehouseRepository,
    inventory_service: InventoryService,
    reservation_service: ReservationService,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDocumentLine {
    pub product_unit_id: Uuid,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
    pub lot_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub supplier_name: Option<String>,
    pub supplier_batch_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentLine {
    pub product_unit_id: Option<Uuid>,
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentWithLines {
    #[serde(flatten)]
    pub document: StockDocument,
    pub lines: Vec<StockDocumentLine>,
}

impl DocumentService {
    pub fn new(
        document_repo: DocumentRepository,
        warehouse_repo: WarehouseRepository,
        inventory_service: InventoryService,
        reservation_service: ReservationService,
    ) -> Self {
        Self {
            document_repo,
            warehouse_repo,
            inventory_service,
            reservation_service,
        }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        document_type: DocumentType,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        reference_number: Option<&str>,
        note: Option<&str>,
    ) -> Result<StockDocument, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.validate_context(&mut tx, warehouse_id, stock_location_id)
            .await?;
        let doc = self
            .document_repo
            .create(
                &mut *tx,
                document_type,
                warehouse_id,
                stock_location_id,
                reference_number,
                note,
            )
            .await?;
        tx.commit().await?;

        tracing::info!("Documento {:?} {} criado em rascunho", document_type, doc.id);
        Ok(doc)
    }

    /// Adiciona uma linha a um rascunho. Para OUTBOUND a reserva FEFO é
    /// feita AQUI e o recibo fica gravado na linha; para INBOUND o número de
    /// lote é validado cedo (feedback imediato, sem mutação).
    pub async fn add_line<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
        line: NewDocumentLine,
    ) -> Result<StockDocumentLine, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let doc = self
            .document_repo
            .find_by_id_for_update(&mut *tx, document_id)
            .await?
            .ok_or(AppError::DocumentNotFound(document_id))?;
        doc.ensure_draft()?;

        let created = self.attach_line(&mut tx, &doc, line).await?;
        tx.commit().await?;
        Ok(created)
    }

    /// Versão em massa: valida todas as linhas antes de reservar qualquer
    /// uma; o grupo inteiro entra ou nada entra.
    pub async fn add_lines_bulk<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
        lines: Vec<NewDocumentLine>,
    ) -> Result<Vec<StockDocumentLine>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let doc = self
            .document_repo
            .find_by_id_for_update(&mut *tx, document_id)
            .await?
            .ok_or(AppError::DocumentNotFound(document_id))?;
        doc.ensure_draft()?;

        // Valida tudo primeiro, para uma falha tardia não deixar reservas
        // já feitas de linhas anteriores.
        for line in &lines {
            self.validate_line(&mut tx, &doc, line).await?;
        }

        let mut created = Vec::with_capacity(lines.len());
        for line in lines {
            created.push(self.attach_line(&mut tx, &doc, line).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Edita produto/quantidade de uma linha de rascunho. Se a linha OUTBOUND
    /// já tem recibo, a reserva antiga é liberada e uma nova é feita — o
    /// recibo gravado sempre reflete a linha como ela está.
    pub async fn update_line<'e, E>(
        &self,
        executor: E,
        line_id: Uuid,
        changes: UpdateDocumentLine,
    ) -> Result<StockDocumentLine, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut line = self
            .document_repo
            .find_line(&mut *tx, line_id)
            .await?
            .ok_or(AppError::DocumentLineNotFound(line_id))?;
        let doc = self
            .document_repo
            .find_by_id_for_update(&mut *tx, line.document_id)
            .await?
            .ok_or(AppError::DocumentNotFound(line.document_id))?;
        doc.ensure_draft()?;

        if let Some(receipt) = line.reservations()? {
            self.reservation_service
                .release_reservation(
                    &mut *tx,
                    line.product_unit_id,
                    doc.warehouse_id,
                    doc.stock_location_id,
                    line.quantity,
                    &receipt,
                )
                .await?;
            line.reserved_lot_info = None;
        }

        if let Some(product) = changes.product_unit_id {
            line.product_unit_id = product;
        }
        if let Some(quantity) = changes.quantity {
            if quantity <= 0 {
                return Err(AppError::InvalidQuantity(format!(
                    "a quantidade da linha deve ser positiva (recebido {quantity})"
                )));
            }
            line.quantity = quantity;
        }

        if doc.document_type == DocumentType::Outbound {
            let reserve = self
                .reservation_service
                .reserve_stock(
                    &mut *tx,
                    line.product_unit_id,
                    doc.warehouse_id,
                    doc.stock_location_id,
                    line.quantity,
                )
                .await?;
            line.reserved_lot_info = Some(encode_reservations(&reserve.lot_reservations)?);
        }

        self.document_repo.save_line(&mut *tx, &line).await?;
        tx.commit().await?;
        Ok(line)
    }

    /// Remove uma linha de rascunho, devolvendo a reserva se houver recibo.
    pub async fn delete_line<'e, E>(&self, executor: E, line_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let line = self
            .document_repo
            .find_line(&mut *tx, line_id)
            .await?
            .ok_or(AppError::DocumentLineNotFound(line_id))?;
        let doc = self
            .document_repo
            .find_by_id_for_update(&mut *tx, line.document_id)
            .await?
            .ok_or(AppError::DocumentNotFound(line.document_id))?;
        doc.ensure_draft()?;

        if let Some(receipt) = line.reservations()? {
            self.reservation_service
                .release_reservation(
                    &mut *tx,
                    line.product_unit_id,
                    doc.warehouse_id,
                    doc.stock_location_id,
                    line.quantity,
                    &receipt,
                )
                .await?;
        }

        self.document_repo.delete_line(&mut *tx, line_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Aprova o rascunho: cada linha INBOUND vira entrada de lote + IMPORT;
    /// cada linha OUTBOUND consome exatamente o recibo gravado na reserva.
    /// Uma linha falhando derruba o documento inteiro — aplicação parcial
    /// dessincronizaria agregado e lotes.
    pub async fn approve<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<StockDocument, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let doc = self
            .document_repo
            .find_by_id_for_update(&mut *tx, document_id)
            .await?
            .ok_or(AppError::DocumentNotFound(document_id))?;
        doc.ensure_draft()?;

        let lines = self
            .document_repo
            .lines_by_document(&mut *tx, document_id)
            .await?;
        tracing::info!(
            "Aprovando documento {:?} {} com {} linha(s)",
            doc.document_type,
            document_id,
            lines.len()
        );

        for line in &lines {
            match doc.document_type {
                DocumentType::Inbound => {
                    self.inventory_service
                        .process_inbound(
                            &mut *tx,
                            InboundStockRequest {
                                product_unit_id: line.product_unit_id,
                                warehouse_id: doc.warehouse_id,
                                stock_location_id: doc.stock_location_id,
                                quantity: line.quantity,
                                transaction_date: None,
                                lot_number: line.lot_number.clone(),
                                expiry_date: line.expiry_date,
                                manufacturing_date: line.manufacturing_date,
                                supplier_name: line.supplier_name.clone(),
                                supplier_batch_number: line.supplier_batch_number.clone(),
                                note: Some(format!("Do documento {}", doc.id)),
                                reference_number: doc.reference_number.clone(),
                            },
                        )
                        .await?;
                }
                DocumentType::Outbound => {
                    let receipt = line.reservations()?.ok_or_else(|| {
                        AppError::InvalidState(format!(
                            "a linha {} não tem recibo de reserva; o estoque não foi \
                             reservado quando a linha entrou no documento",
                            line.id
                        ))
                    })?;
                    self.reservation_service
                        .consume_reserved_stock(
                            &mut *tx,
                            line.product_unit_id,
                            doc.warehouse_id,
                            doc.stock_location_id,
                            line.quantity,
                            &receipt,
                        )
                        .await?;
                    // Registro EXPORT no razão de movimentações, para a
                    // trilha de auditoria (o saldo já foi baixado acima).
                    self.inventory_service
                        .record_export_for_document(&mut tx, &doc, line)
                        .await?;
                }
            }
        }

        let approved = self
            .document_repo
            .update_status(&mut *tx, document_id, DocumentStatus::Approved, None)
            .await?;
        tx.commit().await?;

        tracing::info!("Documento {} aprovado", document_id);
        Ok(approved)
    }

    /// Cancela o rascunho, devolvendo as reservas das linhas OUTBOUND.
    /// Linhas INBOUND não têm o que devolver — nada foi reservado.
    pub async fn cancel<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<StockDocument, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.cancel_with_reason(executor, document_id, None).await
    }

    /// Rejeição = cancelamento de rascunho com o motivo registrado na nota.
    pub async fn reject<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
        reason: &str,
    ) -> Result<StockDocument, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        self.cancel_with_reason(executor, document_id, Some(reason))
            .await
    }

    async fn cancel_with_reason<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
        reason: Option<&str>,
    ) -> Result<StockDocument, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let doc = self
            .document_repo
            .find_by_id_for_update(&mut *tx, document_id)
            .await?
            .ok_or(AppError::DocumentNotFound(document_id))?;
        doc.ensure_draft()?;

        let lines = self
            .document_repo
            .lines_by_document(&mut *tx, document_id)
            .await?;
        for line in &lines {
            if let Some(receipt) = line.reservations()? {
                self.reservation_service
                    .release_reservation(
                        &mut *tx,
                        line.product_unit_id,
                        doc.warehouse_id,
                        doc.stock_location_id,
                        line.quantity,
                        &receipt,
                    )
                    .await?;
            }
        }

        let note = reason.filter(|r| !r.trim().is_empty()).map(|r| {
            match &doc.note {
                Some(existing) if !existing.is_empty() => {
                    format!("{existing} | Rejeitado: {}", r.trim())
                }
                _ => format!("Rejeitado: {}", r.trim()),
            }
        });

        let cancelled = self
            .document_repo
            .update_status(
                &mut *tx,
                document_id,
                DocumentStatus::Cancelled,
                note.as_deref(),
            )
            .await?;
        tx.commit().await?;

        tracing::info!("Documento {} cancelado", document_id);
        Ok(cancelled)
    }

    // ---
    // Consultas
    // ---

    pub async fn get_by_id<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<DocumentWithLines, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;
        let document = self
            .document_repo
            .find_by_id(&mut *conn, document_id)
            .await?
            .ok_or(AppError::DocumentNotFound(document_id))?;
        let lines = self
            .document_repo
            .lines_by_document(&mut *conn, document_id)
            .await?;
        Ok(DocumentWithLines { document, lines })
    }

    pub async fn get_lines<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<Vec<StockDocumentLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.document_repo
            .lines_by_document(executor, document_id)
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<StockDocument>, AppError> {
        self.document_repo.list_all().await
    }

    pub async fn list_by_warehouse(
        &self,
        warehouse_id: Uuid,
    ) -> Result<Vec<StockDocument>, AppError> {
        self.document_repo.list_by_warehouse(warehouse_id).await
    }

    // ---
    // Internos
    // ---

    /// Validações de linha sem efeito colateral (usadas pelo caminho bulk
    /// antes de qualquer reserva).
    async fn validate_line(
        &self,
        conn: &mut PgConnection,
        doc: &StockDocument,
        line: &NewDocumentLine,
    ) -> Result<(), AppError> {
        if line.quantity <= 0 {
            return Err(AppError::InvalidQuantity(format!(
                "a quantidade da linha deve ser positiva (recebido {})",
                line.quantity
            )));
        }
        match doc.document_type {
            DocumentType::Inbound => {
                self.inventory_service
                    .lot_service()
                    .validate_lot_number_for_inbound_draft(
                        &mut *conn,
                        line.product_unit_id,
                        doc.warehouse_id,
                        doc.stock_location_id,
                        line.lot_number.as_deref(),
                    )
                    .await?;
            }
            DocumentType::Outbound => {
                let info = self
                    .reservation_service
                    .get_available_quantity_info(
                        &mut *conn,
                        line.product_unit_id,
                        doc.warehouse_id,
                        doc.stock_location_id,
                    )
                    .await?;
                if info.available_from_balance < line.quantity
                    || info.available_from_lots < line.quantity
                {
                    return Err(AppError::InsufficientStock {
                        requested: line.quantity,
                        available: info.available_from_lots.min(info.available_from_balance),
                        product_unit_id: line.product_unit_id,
                    });
                }
            }
        }
        Ok(())
    }

    /// Valida, reserva (OUTBOUND) e insere a linha.
    async fn attach_line(
        &self,
        conn: &mut PgConnection,
        doc: &StockDocument,
        line: NewDocumentLine,
    ) -> Result<StockDocumentLine, AppError> {
        self.validate_line(&mut *conn, doc, &line).await?;

        let reserved_lot_info = match doc.document_type {
            DocumentType::Outbound => {
                let reserve = self
                    .reservation_service
                    .reserve_stock(
                        &mut *conn,
                        line.product_unit_id,
                        doc.warehouse_id,
                        doc.stock_location_id,
                        line.quantity,
                    )
                    .await?;
                Some(encode_reservations(&reserve.lot_reservations)?)
            }
            DocumentType::Inbound => None,
        };

        let created = self
            .document_repo
            .create_line(
                &mut *conn,
                doc.id,
                line.product_unit_id,
                line.quantity,
                line.lot_number.as_deref(),
                line.expiry_date,
                line.manufacturing_date,
                line.supplier_name.as_deref(),
                line.supplier_batch_number.as_deref(),
                reserved_lot_info.as_deref(),
            )
            .await?;
        Ok(created)
    }

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
