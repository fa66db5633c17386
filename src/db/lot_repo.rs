// src/db/lot_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::stock::{LotStatus, StockLot},
};

// Colunas na ordem da tabela; os SELECTs usam * e o UPDATE grava o estado
// de quantidades/descritivo calculado no modelo (o banco nunca recalcula).
#[derive(Clone)]
pub struct LotRepository {
    pool: PgPool,
}

impl LotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras simples (pool principal)
    // ---

    pub async fn find_near_expiry(
        &self,
        threshold: NaiveDate,
    ) -> Result<Vec<StockLot>, AppError> {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE expiry_date IS NOT NULL
              AND expiry_date <= $1
              AND status = 'ACTIVE'
              AND available_quantity > 0
            ORDER BY expiry_date ASC
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        Ok(lots)
    }

    pub async fn find_expired(&self, today: NaiveDate) -> Result<Vec<StockLot>, AppError> {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE expiry_date IS NOT NULL
              AND expiry_date < $1
              AND status = 'ACTIVE'
            ORDER BY expiry_date ASC
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(lots)
    }

    /// Variante travada, usada pela varredura que marca lotes vencidos.
    pub async fn find_expired_for_update<'e, E>(
        &self,
        executor: E,
        today: NaiveDate,
    ) -> Result<Vec<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE expiry_date IS NOT NULL
              AND expiry_date < $1
              AND status = 'ACTIVE'
            ORDER BY expiry_date ASC
            FOR UPDATE
            "#,
        )
        .bind(today)
        .fetch_all(executor)
        .await?;
        Ok(lots)
    }

    /// Lotes com reserva pendente em um (produto, armazém, posição).
    pub async fn find_reserved(
        &self,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Vec<StockLot>, AppError> {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE product_unit_id = $1 AND warehouse_id = $2 AND stock_location_id = $3
              AND status = 'ACTIVE' AND reserved_quantity > 0
            ORDER BY expiry_date ASC NULLS LAST, created_at ASC
            "#,
        )
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lots)
    }

    pub async fn find_by_triple_and_status(
        &self,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        status: LotStatus,
    ) -> Result<Vec<StockLot>, AppError> {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE product_unit_id = $1 AND warehouse_id = $2 AND stock_location_id = $3
              AND status = $4
            ORDER BY expiry_date ASC NULLS LAST, created_at ASC
            "#,
        )
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(lots)
    }

    /// Contagem de lotes por status (estatísticas).
    pub async fn count_by_status(&self) -> Result<Vec<(LotStatus, i64)>, AppError> {
        let counts = sqlx::query_as::<_, (LotStatus, i64)>(
            "SELECT status, COUNT(*) FROM stock_lots GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    // ---
    // Leituras transacionais (executor)
    // ---

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        lot_id: Uuid,
    ) -> Result<Option<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lot = sqlx::query_as::<_, StockLot>("SELECT * FROM stock_lots WHERE id = $1")
            .bind(lot_id)
            .fetch_optional(executor)
            .await?;
        Ok(lot)
    }

    /// Carrega e tranca a linha do lote até o fim da transação.
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        lot_id: Uuid,
    ) -> Result<Option<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lot =
            sqlx::query_as::<_, StockLot>("SELECT * FROM stock_lots WHERE id = $1 FOR UPDATE")
                .bind(lot_id)
                .fetch_optional(executor)
                .await?;
        Ok(lot)
    }

    pub async fn find_by_number<'e, E>(
        &self,
        executor: E,
        lot_number: &str,
    ) -> Result<Option<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lot = sqlx::query_as::<_, StockLot>("SELECT * FROM stock_lots WHERE lot_number = $1")
            .bind(lot_number)
            .fetch_optional(executor)
            .await?;
        Ok(lot)
    }

    /// Busca pelo número dentro de um contexto exato, com trava de linha
    /// (usada pelo upsert de entrada).
    pub async fn find_by_number_at_for_update<'e, E>(
        &self,
        executor: E,
        lot_number: &str,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Option<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lot = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE lot_number = $1 AND product_unit_id = $2
              AND warehouse_id = $3 AND stock_location_id = $4
            FOR UPDATE
            "#,
        )
        .bind(lot_number)
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .fetch_optional(executor)
        .await?;
        Ok(lot)
    }

    // ---
    // Candidatos FEFO
    // ---
    // As queries só FILTRAM os candidatos; a ordem final (validade ASC com
    // nulos por último, criação ASC) é decidida pelo alocador em
    // `services::fefo`. O ORDER BY aqui serve às listagens.

    pub async fn find_available_for_fefo<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Vec<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE product_unit_id = $1 AND warehouse_id = $2 AND stock_location_id = $3
              AND status = 'ACTIVE' AND available_quantity > 0
            ORDER BY expiry_date ASC NULLS LAST, created_at ASC
            "#,
        )
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .fetch_all(executor)
        .await?;
        Ok(lots)
    }

    /// Variante com trava de linha, usada dentro da transação de reserva:
    /// os lotes candidatos ficam presos junto com o saldo até o commit.
    pub async fn find_available_for_fefo_for_update<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Vec<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE product_unit_id = $1 AND warehouse_id = $2 AND stock_location_id = $3
              AND status = 'ACTIVE' AND available_quantity > 0
            ORDER BY expiry_date ASC NULLS LAST, created_at ASC
            FOR UPDATE
            "#,
        )
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .fetch_all(executor)
        .await?;
        Ok(lots)
    }

    /// Candidatos em todos os armazéns e posições.
    pub async fn find_available_by_product<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
    ) -> Result<Vec<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE product_unit_id = $1 AND status = 'ACTIVE' AND available_quantity > 0
            ORDER BY expiry_date ASC NULLS LAST, created_at ASC
            "#,
        )
        .bind(product_unit_id)
        .fetch_all(executor)
        .await?;
        Ok(lots)
    }

    /// Candidatos em todas as posições de um armazém.
    pub async fn find_available_by_warehouse<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<Vec<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE product_unit_id = $1 AND warehouse_id = $2
              AND status = 'ACTIVE' AND available_quantity > 0
            ORDER BY expiry_date ASC NULLS LAST, created_at ASC
            "#,
        )
        .bind(product_unit_id)
        .bind(warehouse_id)
        .fetch_all(executor)
        .await?;
        Ok(lots)
    }

    /// Candidatos em uma posição, qualquer armazém.
    pub async fn find_available_by_location<'e, E>(
        &self,
        executor: E,
        product_unit_id: Uuid,
        stock_location_id: Uuid,
    ) -> Result<Vec<StockLot>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lots = sqlx::query_as::<_, StockLot>(
            r#"
            SELECT * FROM stock_lots
            WHERE product_unit_id = $1 AND stock_location_id = $2
              AND status = 'ACTIVE' AND available_quantity > 0
            ORDER BY expiry_date ASC NULLS LAST, created_at ASC
            "#,
        )
        .bind(product_unit_id)
        .bind(stock_location_id)
        .fetch_all(executor)
        .await?;
        Ok(lots)
    }

    // ---
    // Escritas
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        lot_number: &str,
        product_unit_id: Uuid,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        quantity: i32,
        expiry_date: Option<NaiveDate>,
        manufacturing_date: Option<NaiveDate>,
        supplier_name: Option<&str>,
        supplier_batch_number: Option<&str>,
        note: Option<&str>,
    ) -> Result<StockLot, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lot = sqlx::query_as::<_, StockLot>(
            r#"
            INSERT INTO stock_lots (
                lot_number, product_unit_id, warehouse_id, stock_location_id,
                expiry_date, manufacturing_date, supplier_name, supplier_batch_number,
                initial_quantity, current_quantity, reserved_quantity,
                available_quantity, status, note
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, 0, $9, 'ACTIVE', $10)
            RETURNING *
            "#,
        )
        .bind(lot_number)
        .bind(product_unit_id)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .bind(expiry_date)
        .bind(manufacturing_date)
        .bind(supplier_name)
        .bind(supplier_batch_number)
        .bind(quantity)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(lot)
    }

    /// Persiste o estado mutável do lote calculado no modelo.
    pub async fn save<'e, E>(&self, executor: E, lot: &StockLot) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE stock_lots SET
                expiry_date = $2,
                manufacturing_date = $3,
                supplier_name = $4,
                supplier_batch_number = $5,
                initial_quantity = $6,
                current_quantity = $7,
                reserved_quantity = $8,
                available_quantity = $9,
                status = $10,
                note = $11,
                updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(lot.id)
        .bind(lot.expiry_date)
        .bind(lot.manufacturing_date)
        .bind(&lot.supplier_name)
        .bind(&lot.supplier_batch_number)
        .bind(lot.initial_quantity)
        .bind(lot.current_quantity)
        .bind(lot.reserved_quantity)
        .bind(lot.available_quantity)
        .bind(lot.status)
        .bind(&lot.note)
        .bind(lot.updated_at)
        .execute(executor)
        .await?;
        Ok(())
    }
}
