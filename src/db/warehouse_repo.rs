// src/db/warehouse_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::warehouse::{StockLocation, Warehouse},
};

#[derive(Clone)]
pub struct WarehouseRepository {
    pool: PgPool,
}

impl WarehouseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Armazéns
    // ---

    pub async fn list_warehouses(&self) -> Result<Vec<Warehouse>, AppError> {
        let warehouses =
            sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(warehouses)
    }

    pub async fn find_warehouse<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
    ) -> Result<Option<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>("SELECT * FROM warehouses WHERE id = $1")
            .bind(warehouse_id)
            .fetch_optional(executor)
            .await?;
        Ok(warehouse)
    }

    pub async fn create_warehouse<'e, E>(
        &self,
        executor: E,
        name: &str,
        address: Option<&str>,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            INSERT INTO warehouses (name, address)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(address)
        .fetch_one(executor)
        .await?;
        Ok(warehouse)
    }

    pub async fn set_warehouse_active<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
        active: bool,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            UPDATE warehouses SET active = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(warehouse_id)
        .bind(active)
        .fetch_one(executor)
        .await?;
        Ok(warehouse)
    }

    // ---
    // Posições de estoque
    // ---

    pub async fn list_locations_by_warehouse(
        &self,
        warehouse_id: Uuid,
    ) -> Result<Vec<StockLocation>, AppError> {
        let locations = sqlx::query_as::<_, StockLocation>(
            "SELECT * FROM stock_locations WHERE warehouse_id = $1 ORDER BY name ASC",
        )
        .bind(warehouse_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    pub async fn find_location<'e, E>(
        &self,
        executor: E,
        stock_location_id: Uuid,
    ) -> Result<Option<StockLocation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location =
            sqlx::query_as::<_, StockLocation>("SELECT * FROM stock_locations WHERE id = $1")
                .bind(stock_location_id)
                .fetch_optional(executor)
                .await?;
        Ok(location)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_location<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
        name: &str,
        description: Option<&str>,
        zone: Option<&str>,
        aisle: Option<&str>,
        rack: Option<&str>,
        level: Option<&str>,
        position: Option<&str>,
    ) -> Result<StockLocation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, StockLocation>(
            r#"
            INSERT INTO stock_locations (
                warehouse_id, name, description, zone, aisle, rack, level, position
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(warehouse_id)
        .bind(name)
        .bind(description)
        .bind(zone)
        .bind(aisle)
        .bind(rack)
        .bind(level)
        .bind(position)
        .fetch_one(executor)
        .await?;
        Ok(location)
    }

    pub async fn set_location_active<'e, E>(
        &self,
        executor: E,
        stock_location_id: Uuid,
        active: bool,
    ) -> Result<StockLocation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, StockLocation>(
            r#"
            UPDATE stock_locations SET active = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(stock_location_id)
        .bind(active)
        .fetch_one(executor)
        .await?;
        Ok(location)
    }
}
