// src/db/transaction_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::stock::{StockTransaction, TransactionType},
};

#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Listagem com filtros opcionais (tipo, armazém, posição).
    pub async fn list(
        &self,
        transaction_type: Option<TransactionType>,
        warehouse_id: Option<Uuid>,
        stock_location_id: Option<Uuid>,
    ) -> Result<Vec<StockTransaction>, AppError> {
        let transactions = sqlx::query_as::<_, StockTransaction>(
            r#"
            SELECT * FROM stock_transactions
            WHERE ($1::transaction_type IS NULL OR transaction_type = $1)
              AND ($2::uuid IS NULL OR warehouse_id = $2)
              AND ($3::uuid IS NULL OR stock_location_id = $3)
            ORDER BY transaction_date DESC, created_at DESC
            "#,
        )
        .bind(transaction_type)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
    ) -> Result<Option<StockTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction =
            sqlx::query_as::<_, StockTransaction>("SELECT * FROM stock_transactions WHERE id = $1")
                .bind(transaction_id)
                .fetch_optional(executor)
                .await?;
        Ok(transaction)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        transaction_type: TransactionType,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        quantity: i32,
        transaction_date: DateTime<Utc>,
        note: Option<&str>,
        reference_number: Option<&str>,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, StockTransaction>(
            r#"
            INSERT INTO stock_transactions (
                transaction_type, product_unit_id, warehouse_id, stock_location_id,
                quantity, transaction_date, note, reference_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(transaction_type)
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .bind(quantity)
        .bind(transaction_date)
        .bind(note)
        .bind(reference_number)
        .fetch_one(executor)
        .await?;
        Ok(transaction)
    }

    /// Atualiza nota/referência (o aceite de saída carimba a nota aqui).
    pub async fn update_note<'e, E>(
        &self,
        executor: E,
        transaction_id: Uuid,
        note: Option<&str>,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transaction = sqlx::query_as::<_, StockTransaction>(
            r#"
            UPDATE stock_transactions
            SET note = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(transaction_id)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(transaction)
    }

    pub async fn delete<'e, E>(&self, executor: E, transaction_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM stock_transactions WHERE id = $1")
            .bind(transaction_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
