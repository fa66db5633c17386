// src/services/warehouse_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::WarehouseRepository,
    models::warehouse::{StockLocation, Warehouse},
};

#[derive(Clone)]
pub struct WarehouseService {
    warehouse_repo: WarehouseRepository,
}

impl WarehouseService {
    pub fn new(warehouse_repo: WarehouseRepository) -> Self {
        Self { warehouse_repo }
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
        self.warehouse_repo
            .create_warehouse(executor, name, address)
            .await
    }

    pub async fn get_warehouse<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.warehouse_repo
            .find_warehouse(executor, warehouse_id)
            .await?
            .ok_or(AppError::WarehouseNotFound(warehouse_id))
    }

    pub async fn list_warehouses(&self) -> Result<Vec<Warehouse>, AppError> {
        self.warehouse_repo.list_warehouses().await
    }

    /// Desativação suave — o armazém continua referenciado por lotes e
    /// saldos existentes.
    pub async fn deactivate_warehouse<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.warehouse_repo
            .find_warehouse(&mut *tx, warehouse_id)
            .await?
            .ok_or(AppError::WarehouseNotFound(warehouse_id))?;
        let warehouse = self
            .warehouse_repo
            .set_warehouse_active(&mut *tx, warehouse_id, false)
            .await?;
        tx.commit().await?;
        Ok(warehouse)
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
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.warehouse_repo
            .find_warehouse(&mut *tx, warehouse_id)
            .await?
            .ok_or(AppError::WarehouseNotFound(warehouse_id))?;
        let location = self
            .warehouse_repo
            .create_location(
                &mut *tx,
                warehouse_id,
                name,
                description,
                zone,
                aisle,
                rack,
                level,
                position,
            )
            .await?;
        tx.commit().await?;
        Ok(location)
    }

    pub async fn get_location<'e, E>(
        &self,
        executor: E,
        stock_location_id: Uuid,
    ) -> Result<StockLocation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.warehouse_repo
            .find_location(executor, stock_location_id)
            .await?
            .ok_or(AppError::StockLocationNotFound(stock_location_id))
    }

    pub async fn list_locations(
        &self,
        warehouse_id: Uuid,
    ) -> Result<Vec<StockLocation>, AppError> {
        self.warehouse_repo
            .list_locations_by_warehouse(warehouse_id)
            .await
    }

    pub async fn deactivate_location<'e, E>(
        &self,
        executor: E,
        stock_location_id: Uuid,
    ) -> Result<StockLocation, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.warehouse_repo
            .find_location(&mut *tx, stock_location_id)
            .await?
            .ok_or(AppError::StockLocationNotFound(stock_location_id))?;
        let location = self
            .warehouse_repo
            .set_location_active(&mut *tx, stock_location_id, false)
            .await?;
        tx.commit().await?;
        Ok(location)
    }
}
