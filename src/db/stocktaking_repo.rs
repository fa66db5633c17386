// src/db/stocktaking_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::stocktaking::{Stocktaking, StocktakingDetail, StocktakingStatus},
};

#[derive(Clone)]
pub struct StocktakingRepository {
    pool: PgPool,
}

impl StocktakingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<Stocktaking>, AppError> {
        let stocktakings = sqlx::query_as::<_, Stocktaking>(
            "SELECT * FROM stocktakings ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stocktakings)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
    ) -> Result<Option<Stocktaking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stocktaking =
            sqlx::query_as::<_, Stocktaking>("SELECT * FROM stocktakings WHERE id = $1")
                .bind(stocktaking_id)
                .fetch_optional(executor)
                .await?;
        Ok(stocktaking)
    }

    /// Trava a sessão durante a confirmação (a confirmação é de mão única).
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
    ) -> Result<Option<Stocktaking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stocktaking =
            sqlx::query_as::<_, Stocktaking>("SELECT * FROM stocktakings WHERE id = $1 FOR UPDATE")
                .bind(stocktaking_id)
                .fetch_optional(executor)
                .await?;
        Ok(stocktaking)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        stocktaking_number: &str,
        warehouse_id: Uuid,
        stock_location_id: Uuid,
        stocktaking_date: DateTime<Utc>,
        note: Option<&str>,
    ) -> Result<Stocktaking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stocktaking = sqlx::query_as::<_, Stocktaking>(
            r#"
            INSERT INTO stocktakings (
                stocktaking_number, warehouse_id, stock_location_id,
                status, stocktaking_date, note
            )
            VALUES ($1, $2, $3, 'IN_PROGRESS', $4, $5)
            RETURNING *
            "#,
        )
        .bind(stocktaking_number)
        .bind(warehouse_id)
        .bind(stock_location_id)
        .bind(stocktaking_date)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(stocktaking)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
        status: StocktakingStatus,
        completed_date: Option<DateTime<Utc>>,
    ) -> Result<Stocktaking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stocktaking = sqlx::query_as::<_, Stocktaking>(
            r#"
            UPDATE stocktakings
            SET status = $2, completed_date = COALESCE($3, completed_date), updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(stocktaking_id)
        .bind(status)
        .bind(completed_date)
        .fetch_one(executor)
        .await?;
        Ok(stocktaking)
    }

    pub async fn create_detail<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
        product_unit_id: Uuid,
        system_quantity: i32,
        actual_quantity: i32,
        note: Option<&str>,
    ) -> Result<StocktakingDetail, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let detail = sqlx::query_as::<_, StocktakingDetail>(
            r#"
            INSERT INTO stocktaking_details (
                stocktaking_id, product_unit_id, system_quantity, actual_quantity, note
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(stocktaking_id)
        .bind(product_unit_id)
        .bind(system_quantity)
        .bind(actual_quantity)
        .bind(note)
        .fetch_one(executor)
        .await?;
        Ok(detail)
    }

    pub async fn details_by_stocktaking<'e, E>(
        &self,
        executor: E,
        stocktaking_id: Uuid,
    ) -> Result<Vec<StocktakingDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let details = sqlx::query_as::<_, StocktakingDetail>(
            r#"
            SELECT * FROM stocktaking_details
            WHERE stocktaking_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(stocktaking_id)
        .fetch_all(executor)
        .await?;
        Ok(details)
    }
}
