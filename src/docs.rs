// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Armazéns e posições ---
        handlers::warehouses::create_warehouse,
        handlers::warehouses::list_warehouses,
        handlers::warehouses::get_warehouse,
        handlers::warehouses::deactivate_warehouse,
        handlers::warehouses::create_location,
        handlers::warehouses::list_locations,
        handlers::warehouses::get_location,
        handlers::warehouses::deactivate_location,

        // --- Transações de estoque ---
        handlers::inventory::create_transaction,
        handlers::inventory::list_transactions,
        handlers::inventory::get_transaction,
        handlers::inventory::delete_transaction,
        handlers::inventory::process_inbound,
        handlers::inventory::process_bulk_inbound,
        handlers::inventory::process_outbound,
        handlers::inventory::process_bulk_outbound,
        handlers::inventory::process_transfer,
        handlers::inventory::process_adjustment,
        handlers::inventory::accept_outbound,
        handlers::inventory::accept_bulk_outbound,

        // --- Lotes ---
        handlers::lots::get_lot,
        handlers::lots::get_lot_by_number,
        handlers::lots::list_lots_by_triple,
        handlers::lots::list_available_lots,
        handlers::lots::list_lots_near_expiry,
        handlers::lots::list_expired_lots,
        handlers::lots::list_reserved_lots,
        handlers::lots::lot_statistics,
        handlers::lots::update_lot,
        handlers::lots::update_lot_status,
        handlers::lots::reserve_lot,
        handlers::lots::release_lot,
        handlers::lots::consume_lot,
        handlers::lots::mark_expired_lots,
        handlers::lots::delete_lot,

        // --- Saldos ---
        handlers::balances::list_balances,
        handlers::balances::get_balance_by_triple,
        handlers::balances::get_availability_info,
        handlers::balances::check_availability,
        handlers::balances::get_product_totals,
        handlers::balances::adjust_balance,

        // --- Documentos de estoque ---
        handlers::documents::create_document,
        handlers::documents::list_documents,
        handlers::documents::get_document,
        handlers::documents::add_line,
        handlers::documents::add_lines_bulk,
        handlers::documents::get_lines,
        handlers::documents::update_line,
        handlers::documents::delete_line,
        handlers::documents::approve_document,
        handlers::documents::cancel_document,
        handlers::documents::reject_document,

        // --- Contagens de inventário ---
        handlers::stocktakings::create_stocktaking,
        handlers::stocktakings::list_stocktakings,
        handlers::stocktakings::get_stocktaking,
        handlers::stocktakings::add_detail,
        handlers::stocktakings::confirm_stocktaking,
        handlers::stocktakings::cancel_stocktaking,
    ),
    components(
        schemas(
            // --- Modelos ---
            models::warehouse::Warehouse,
            models::warehouse::StockLocation,
            models::stock::LotStatus,
            models::stock::StockLot,
            models::stock::StockBalance,
            models::stock::TransactionType,
            models::stock::StockTransaction,
            models::document::DocumentType,
            models::document::DocumentStatus,
            models::document::StockDocument,
            models::document::StockDocumentLine,
            models::document::LotReservation,
            models::stocktaking::StocktakingStatus,
            models::stocktaking::Stocktaking,
            models::stocktaking::StocktakingDetail,

            // --- Requests e resultados ---
            services::inventory_service::CreateTransactionRequest,
            services::inventory_service::InboundStockRequest,
            services::inventory_service::OutboundStockRequest,
            services::inventory_service::TransferRequest,
            services::inventory_service::AdjustmentRequest,
            services::document_service::NewDocumentLine,
            services::document_service::UpdateDocumentLine,
            services::document_service::DocumentWithLines,
            services::reservation_service::ReserveResult,
            services::reservation_service::ConsumeResult,
            services::reservation_service::AvailableQuantityInfo,
            services::lot_service::LotStatistics,
            services::stocktaking_service::StocktakingDetailPayload,

            // --- Payloads dos handlers ---
            handlers::warehouses::CreateWarehousePayload,
            handlers::warehouses::CreateLocationPayload,
            handlers::inventory::AcceptPayload,
            handlers::inventory::BulkAcceptPayload,
            handlers::lots::UpdateLotPayload,
            handlers::lots::UpdateLotStatusPayload,
            handlers::lots::LotQuantityPayload,
            handlers::balances::AdjustBalancePayload,
            handlers::balances::ProductStockTotals,
            handlers::balances::AvailabilityCheckResult,
            handlers::documents::CreateDocumentPayload,
            handlers::documents::RejectPayload,
            handlers::stocktakings::CreateStocktakingPayload,
            handlers::stocktakings::StocktakingWithDetails,
        )
    ),
    tags(
        (name = "estoque", description = "Razão de lotes com FEFO e reserva em duas fases")
    )
)]
pub struct ApiDoc;
