// src/db.rs

pub mod balance_repo;
pub use balance_repo::BalanceRepository;
pub mod document_repo;
pub use document_repo::DocumentRepository;
pub mod lot_repo;
pub use lot_repo::LotRepository;
pub mod stocktaking_repo;
pub use stocktaking_repo::StocktakingRepository;
pub mod transaction_repo;
pub use transaction_repo::TransactionRepository;
pub mod warehouse_repo;
pub use warehouse_repo::WarehouseRepository;
