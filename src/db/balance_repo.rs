// src/db/balance_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::stock::StockBalance};

#[derive(Clone)]
pub struct BalanceRepository {
    pool: PgPool,
}

impl BalanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras simples (pool principal)
    // ---

    pub async fn list_all(&self) -> Result<Vec<StockBalance>, AppError> {
        let balances = sqlx::query_as::<_, StockBalance>(
            "SELECT * FROM stock_balance ORDER BY last_updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(balances)
    }

    pub async fn list_by_product(
        &self,
        product_unit_id: Uuid,
    ) -> Result<Vec<StockBalance>, AppError> {
        let balances = sqlx::query_as::<_, StockBalance>(
            "SELECT * FROM stock_balance WHERE product_unit_id = $1",
        )
        .bind(product_unit_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(balances)
    }

    pub async fn list_by_warehouse(
        &self,
        warehouse_id: Uuid,
    ) -> Result<Vec<StockBalance>, AppError> {
        let balances = sqlx::query_as::<_, StockBalance>(
            "SELECT * FROM stock_balance WHERE warehouse_id = $1",
        )
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(balances)
    }

    pub async fn list_by_location(
        &self,
        stock_location_id: Uuid,
    ) -> Result<Vec<StockBalance>, AppError> {
        let balances = sqlx::query_as::<_, StockBalance>(
            "SELECT * FROM stock_balance WHERE stock_location_id = $1",
        )
        .bind(stock_location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(balances)
    }

    /// Total físico de um produto, somando todos os armazéns/posições.
    pub async fn total_quantity_by_product(
        &self,
        product_unit_id: Uuid,
    ) -> Result<i32, AppError> {
        let total = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(SUM(quantity), 0)::INT FROM stock_balance WHERE product_unit_id = $1",
        )
        .bind(product_unit_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn total_available_by_product(
        &self,
        product_unit_id: Uuid,
    ) -> Result<i32, AppError> {
        let total = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT COALESCE(SUM(available_quantity), 0)::INT
            FROM stock_balance WHERE product_unit_id = $1
            "#,
        )
        .bind(product_unit_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    // ---
    // Leituras transacionais
    // ---

    pub async fn find_by_triple<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Option<StockBalance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = sqlx::query_as::<_, StockBalance>(
            r#"
            SELECT * FROM stock_balance
            WHERE product_unit_id = $1 AND warehouse_id = $2 AND stock_location_id = $3
            "#,
        )
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Carrega e tranca a linha do saldo até o fim da transação.
    /// Esta linha é o ponto de serialização de todas as reservas e
    /// movimentações do (produto, armazém, posição).
    pub async fn find_by_triple_for_update<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Option<StockBalance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let balance = sqlx::query_as::<_, StockBalance>(
            r#"
            SELECT * FROM stock_balance
            WHERE product_unit_id = $1 AND warehouse_id = $2 AND stock_location_id = $3
            FOR UPDATE
            "#,
        )
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    // ---
    // Escritas
    // ---

    /// Garante que a linha do saldo existe (zerada) para o contexto.
    /// O ON CONFLICT torna a criação preguiçosa atômica entre requisições
    /// concorrentes; quem perde a corrida simplesmente não insere nada.
    pub async fn create_if_absent<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO stock_balance (
                product_unit_id, warehouse_id, stock_location_id,
                quantity, reserved_quantity, available_quantity
            )
            VALUES ($1, $2, $3, 0, 0, 0)
            ON CONFLICT (product_unit_id, warehouse_id, stock_location_id) DO NOTHING
            "#,
        )
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Persiste o estado de quantidades calculado no modelo.
    pub async fn save<'e, E>(&self, executor: E, balance: &StockBalance) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE stock_balance SET
                quantity = $2,
                reserved_quantity = $3,
                available_quantity = $4,
                last_updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(balance.id)
        .bind(balance.quantity)
        .bind(balance.reserved_quantity)
        .bind(balance.available_quantity)
        .bind(balance.last_updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }
}
