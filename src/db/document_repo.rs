// src/db/document_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::document::{DocumentStatus, DocumentType, StockDocument, StockDocumentLine},
};

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras simples (pool principal)
    // ---

    pub async fn list_all(&self) -> Result<Vec<StockDocument>, AppError> {
        let docs = sqlx::query_as::<_, StockDocument>(
            "SELECT * FROM stock_documents ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    pub async fn list_by_warehouse(
        &self,
        warehouse_id: Uuid,
    ) -> Result<Vec<StockDocument>, AppError> {
        let docs = sqlx::query_as::<_, StockDocument>(
            "SELECT * FROM stock_documents WHERE warehouse_id = $1 ORDER BY created_at DESC",
        )
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    // ---
    // Documento
    // ---

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<Option<StockDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let doc = sqlx::query_as::<_, StockDocument>("SELECT * FROM stock_documents WHERE id = $1")
            .bind(document_id)
            .fetch_optional(executor)
            .await?;
        Ok(doc)
    }

    /// Carrega o documento com trava de linha. Aprovar/cancelar tranca o
    /// documento antes de checar o status, tornando DRAFT -> APPROVED uma
    /// transição de mão única mesmo sob concorrência.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<Option<StockDocument>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let doc = sqlx::query_as::<_, StockDocument>(
            "SELECT * FROM stock_documents WHERE id = $1 FOR UPDATE",
        )
        .bind(document_id)
        .fetch_optional(executor)
        .await?;
        Ok(doc)
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
        E: Executor<'e, Database = Postgres>,
    {
        let doc = sqlx::query_as::<_, StockDocument>(
            r#"
            INSERT INTO stock_documents (
                document_type, status, warehouse_id, stock_location_id,
                reference_number, note
            )
            VALUES ($1, 'DRAFT', $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(document_type)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .bind(reference_number)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(doc)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
        status: DocumentStatus,
        note: Option<&str>,
    ) -> Result<StockDocument, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let doc = sqlx::query_as::<_, StockDocument>(
            r#"
            UPDATE stock_documents SET
                status = $2,
                note = COALESCE($3, note),
                approved_at = CASE WHEN $2 = 'APPROVED' THEN now() ELSE approved_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(document_id)
        .bind(status)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(doc)
    }

    // ---
    // Linhas
    // ---

    pub async fn lines_by_document<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
    ) -> Result<Vec<StockDocumentLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lines = sqlx::query_as::<_, StockDocumentLine>(
            "SELECT * FROM stock_document_lines WHERE document_id = $1 ORDER BY created_at ASC",
        )
        .bind(document_id)
        .fetch_all(executor)
        .await?;
        Ok(lines)
    }

    pub async fn find_line<'e, E>(
        &self,
        executor: E,
        line_id: Uuid,
    ) -> Result<Option<StockDocumentLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let line = sqlx::query_as::<_, StockDocumentLine>(
            "SELECT * FROM stock_document_lines WHERE id = $1",
        )
        .bind(line_id)
        .fetch_optional(executor)
        .await?;
        Ok(line)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_line<'e, E>(
        &self,
        executor: E,
        document_id: Uuid,
        product_unit_id: Uuid,
        quantity: i32,
        lot_number: Option<&str>,
        expiry_date: Option<NaiveDate>,
        manufacturing_date: Option<NaiveDate>,
        supplier_name: Option<&str>,
        supplier_batch_number: Option<&str>,
        reserved_lot_info: Option<&str>,
    ) -> Result<StockDocumentLine, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let line = sqlx::query_as::<_, StockDocumentLine>(
            r#"
            INSERT INTO stock_document_lines (
                document_id, product_unit_id, quantity, lot_number,
                expiry_date, manufacturing_date, supplier_name,
                supplier_batch_number, reserved_lot_info
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(document_id)
        .bind(product_unit_id)
        .bind(quantity)
        .bind(lot_number)
        .bind(expiry_date)
        .bind(manufacturing_date)
        .bind(supplier_name)
        .bind(supplier_batch_number)
        .bind(reserved_lot_info)
        .fetch_one(executor)
        .await?;
        Ok(line)
    }

    /// Persiste quantidade e recibo de reserva de uma linha.
    pub async fn save_line<'e, E>(
        &self,
        executor: E,
        line: &StockDocumentLine,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE stock_document_lines SET
                product_unit_id = $2,
                quantity = $3,
                lot_number = $4,
                expiry_date = $5,
                manufacturing_date = $6,
                supplier_name = $7,
                supplier_batch_number = $8,
                reserved_lot_info = $9
            WHERE id = $1
            "#,
        )
        .bind(line.id)
        .bind(line.product_unit_id)
        .bind(line.quantity)
        .bind(&line.lot_number)
        .bind(line.expiry_date)
        .bind(line.manufacturing_date)
        .bind(&line.supplier_name)
        .bind(&line.supplier_batch_number)
        .bind(&line.reserved_lot_info)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_line<'e, E>(&self, executor: E, line_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM stock_document_lines WHERE id = $1")
            .bind(line_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
