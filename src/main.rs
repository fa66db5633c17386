//src/main.rs

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização.
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let warehouse_routes = Router::new()
        .route(
            "/",
            post(handlers::warehouses::create_warehouse).get(handlers::warehouses::list_warehouses),
        )
        .route(
            "/{id}",
            get(handlers::warehouses::get_warehouse)
                .delete(handlers::warehouses::deactivate_warehouse),
        )
        .route(
            "/{id}/locations",
            post(handlers::warehouses::create_location).get(handlers::warehouses::list_locations),
        );

    let location_routes = Router::new().route(
        "/{id}",
        get(handlers::warehouses::get_location).delete(handlers::warehouses::deactivate_location),
    );

    let inventory_routes = Router::new()
        .route(
            "/transactions",
            post(handlers::inventory::create_transaction)
                .get(handlers::inventory::list_transactions),
        )
        .route(
            "/transactions/accept-bulk",
            post(handlers::inventory::accept_bulk_outbound),
        )
        .route(
            "/transactions/{id}",
            get(handlers::inventory::get_transaction)
                .delete(handlers::inventory::delete_transaction),
        )
        .route(
            "/transactions/{id}/accept",
            post(handlers::inventory::accept_outbound),
        )
        .route("/inbound", post(handlers::inventory::process_inbound))
        .route(
            "/inbound/bulk",
            post(handlers::inventory::process_bulk_inbound),
        )
        .route("/outbound", post(handlers::inventory::process_outbound))
        .route(
            "/outbound/bulk",
            post(handlers::inventory::process_bulk_outbound),
        )
        .route("/transfer", post(handlers::inventory::process_transfer))
        .route("/adjustment", post(handlers::inventory::process_adjustment));

    let lot_routes = Router::new()
        .route("/", get(handlers::lots::list_lots_by_triple))
        .route("/available", get(handlers::lots::list_available_lots))
        .route("/near-expiry", get(handlers::lots::list_lots_near_expiry))
        .route("/expired", get(handlers::lots::list_expired_lots))
        .route("/reserved", get(handlers::lots::list_reserved_lots))
        .route("/statistics", get(handlers::lots::lot_statistics))
        .route("/mark-expired", post(handlers::lots::mark_expired_lots))
        .route("/by-number/{number}", get(handlers::lots::get_lot_by_number))
        .route(
            "/{id}",
            get(handlers::lots::get_lot)
                .put(handlers::lots::update_lot)
                .delete(handlers::lots::delete_lot),
        )
        .route("/{id}/status", put(handlers::lots::update_lot_status))
        .route("/{id}/reserve", post(handlers::lots::reserve_lot))
        .route("/{id}/release", post(handlers::lots::release_lot))
        .route("/{id}/consume", post(handlers::lots::consume_lot));

    let balance_routes = Router::new()
        .route("/", get(handlers::balances::list_balances))
        .route("/context", get(handlers::balances::get_balance_by_triple))
        .route(
            "/availability",
            get(handlers::balances::get_availability_info),
        )
        .route(
            "/availability/check",
            get(handlers::balances::check_availability),
        )
        .route(
            "/product/{id}/totals",
            get(handlers::balances::get_product_totals),
        )
        .route("/adjust", post(handlers::balances::adjust_balance));

    let document_routes = Router::new()
        .route(
            "/",
            post(handlers::documents::create_document).get(handlers::documents::list_documents),
        )
        .route("/lines/{lineId}", put(handlers::documents::update_line)
            .delete(handlers::documents::delete_line))
        .route("/{id}", get(handlers::documents::get_document))
        .route(
            "/{id}/lines",
            post(handlers::documents::add_line).get(handlers::documents::get_lines),
        )
        .route("/{id}/lines/bulk", post(handlers::documents::add_lines_bulk))
        .route("/{id}/approve", post(handlers::documents::approve_document))
        .route("/{id}/cancel", post(handlers::documents::cancel_document))
        .route("/{id}/reject", post(handlers::documents::reject_document));

    let stocktaking_routes = Router::new()
        .route(
            "/",
            post(handlers::stocktakings::create_stocktaking)
                .get(handlers::stocktakings::list_stocktakings),
        )
        .route("/{id}", get(handlers::stocktakings::get_stocktaking))
        .route("/{id}/details", post(handlers::stocktakings::add_detail))
        .route(
            "/{id}/confirm",
            post(handlers::stocktakings::confirm_stocktaking),
        )
        .route(
            "/{id}/cancel",
            post(handlers::stocktakings::cancel_stocktaking),
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route(
            "/api/docs/openapi.json",
            get(|| async {
                use utoipa::OpenApi;
                axum::Json(docs::ApiDoc::openapi())
            }),
        )
        .nest("/api/warehouses", warehouse_routes)
        .nest("/api/stock-locations", location_routes)
        .nest("/api/inventory", inventory_routes)
        .nest("/api/lots", lot_routes)
        .nest("/api/stock-balance", balance_routes)
        .nest("/api/stock-documents", document_routes)
        .nest("/api/stocktakings", stocktaking_routes)
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}

