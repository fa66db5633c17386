// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::db::{
    BalanceRepository, DocumentRepository, LotRepository, StocktakingRepository,
    TransactionRepository, WarehouseRepository,
};
use crate::services::{
    numbering::{SharedNumberGenerator, SystemNumberGenerator},
    BalanceService, DocumentService, InventoryService, LotService, ReservationService,
    StocktakingService, WarehouseService,
};

// O estado compartilhado que será acessível em toda a aplicação.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub warehouse_service: WarehouseService,
    pub lot_service: LotService,
    pub balance_service: BalanceService,
    pub reservation_service: ReservationService,
    pub inventory_service: InventoryService,
    pub document_service: DocumentService,
    pub stocktaking_service: StocktakingService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let numbers: SharedNumberGenerator = Arc::new(SystemNumberGenerator);

        let warehouse_repo = WarehouseRepository::new(db_pool.clone());
        let lot_repo = LotRepository::new(db_pool.clone());
        let balance_repo = BalanceRepository::new(db_pool.clone());
        let transaction_repo = TransactionRepository::new(db_pool.clone());
        let document_repo = DocumentRepository::new(db_pool.clone());
        let stocktaking_repo = StocktakingRepository::new(db_pool.clone());

        let warehouse_service = WarehouseService::new(warehouse_repo.clone());
        let lot_service = LotService::new(lot_repo.clone(), numbers.clone());
        let balance_service = BalanceService::new(balance_repo.clone());
        let reservation_service = ReservationService::new(lot_repo, balance_repo);
        let inventory_service = InventoryService::new(
            transaction_repo,
            warehouse_repo.clone(),
            lot_service.clone(),
            balance_service.clone(),
        );
        let document_service = DocumentService::new(
            document_repo,
            warehouse_repo,
            inventory_service.clone(),
            reservation_service.clone(),
        );
        let stocktaking_service = StocktakingService::new(
            stocktaking_repo,
            balance_service.clone(),
            document_service.clone(),
            numbers,
        );

        Ok(Self {
            db_pool,
            warehouse_service,
            lot_service,
            balance_service,
            reservation_service,
            inventory_service,
            document_service,
            stocktaking_service,
        })
    }
}
