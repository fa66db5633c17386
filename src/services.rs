// src/services.rs

pub mod balance_service;
pub use balance_service::BalanceService;
pub mod document_service;
pub use document_service::DocumentService;
pub mod fefo;
pub mod inventory_service;
pub use inventory_service::InventoryService;
pub mod lot_service;
pub use lot_service::LotService;
pub mod numbering;
pub mod reservation_service;
pub use reservation_service::ReservationService;
pub mod stocktaking_service;
pub use stocktaking_service::StocktakingService;
pub mod warehouse_service;
pub use warehouse_service::WarehouseService;
