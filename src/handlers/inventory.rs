// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::stock::TransactionType,
    services::inventory_service::{
        AdjustmentRequest, CreateTransactionRequest, InboundStockRequest, OutboundStockRequest,
        TransferRequest,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub warehouse_id: Option<Uuid>,
    pub stock_location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcceptPayload {
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAcceptPayload {
    pub transaction_ids: Vec<Uuid>,
    pub note: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/inventory/transactions",
    request_body = CreateTransactionRequest,
    responses((status = 201, body = crate::models::stock::StockTransaction))
)]
pub async fn create_transaction(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let transaction = app_state
        .inventory_service
        .create_transaction(&app_state.db_pool, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/transactions",
    responses((status = 200, body = [crate::models::stock::StockTransaction]))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = app_state
        .inventory_service
        .list_transactions(
            filter.transaction_type,
            filter.warehouse_id,
            filter.stock_location_id,
        )
        .await?;
    Ok((StatusCode::OK, Json(transactions)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/transactions/{id}",
    responses((status = 200, body = crate::models::stock::StockTransaction))
)]
pub async fn get_transaction(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = app_state
        .inventory_service
        .get_transaction(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(transaction)))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/transactions/{id}",
    responses((status = 204))
)]
pub async fn delete_transaction(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .inventory_service
        .delete_transaction(&app_state.db_pool, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/inventory/inbound",
    request_body = InboundStockRequest,
    responses((status = 201, body = crate::models::stock::StockTransaction))
)]
pub async fn process_inbound(
    State(app_state): State<AppState>,
    Json(payload): Json<InboundStockRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let transaction = app_state
        .inventory_service
        .process_inbound(&app_state.db_pool, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/inbound/bulk",
    request_body = [InboundStockRequest],
    responses((status = 201, body = [crate::models::stock::StockTransaction]))
)]
pub async fn process_bulk_inbound(
    State(app_state): State<AppState>,
    Json(payload): Json<Vec<InboundStockRequest>>,
) -> Result<impl IntoResponse, AppError> {
    for entry in &payload {
        entry.validate()?;
    }
    let transactions = app_state
        .inventory_service
        .process_bulk_inbound(&app_state.db_pool, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(transactions)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/outbound",
    request_body = OutboundStockRequest,
    responses((status = 201, body = crate::models::stock::StockTransaction))
)]
pub async fn process_outbound(
    State(app_state): State<AppState>,
    Json(payload): Json<OutboundStockRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let transaction = app_state
        .inventory_service
        .process_outbound_with_fefo(&app_state.db_pool, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/outbound/bulk",
    request_body = [OutboundStockRequest],
    responses((status = 201, body = [crate::models::stock::StockTransaction]))
)]
pub async fn process_bulk_outbound(
    State(app_state): State<AppState>,
    Json(payload): Json<Vec<OutboundStockRequest>>,
) -> Result<impl IntoResponse, AppError> {
    for entry in &payload {
        entry.validate()?;
    }
    let transactions = app_state
        .inventory_service
        .process_bulk_outbound(&app_state.db_pool, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(transactions)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/transfer",
    request_body = TransferRequest,
    responses((status = 201, body = [crate::models::stock::StockTransaction]))
)]
pub async fn process_transfer(
    State(app_state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let (export, import) = app_state
        .inventory_service
        .process_transfer(&app_state.db_pool, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(vec![export, import])))
}

#[utoipa::path(
    post,
    path = "/api/inventory/adjustment",
    request_body = AdjustmentRequest,
    responses((status = 201, body = crate::models::stock::StockTransaction))
)]
pub async fn process_adjustment(
    State(app_state): State<AppState>,
    Json(payload): Json<AdjustmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let transaction = app_state
        .inventory_service
        .process_adjustment(&app_state.db_pool, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/transactions/{id}/accept",
    request_body = AcceptPayload,
    responses((status = 200, body = crate::models::stock::StockTransaction))
)]
pub async fn accept_outbound(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AcceptPayload>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = app_state
        .inventory_service
        .accept_outbound(&app_state.db_pool, id, payload.note.as_deref())
        .await?;
    Ok((StatusCode::OK, Json(transaction)))
}

#[utoipa::path(
    post,
    path = "/api/inventory/transactions/accept-bulk",
    request_body = BulkAcceptPayload,
    responses((status = 200, body = [crate::models::stock::StockTransaction]))
)]
pub async fn accept_bulk_outbound(
    State(app_state): State<AppState>,
    Json(payload): Json<BulkAcceptPayload>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = app_state
        .inventory_service
        .accept_bulk_outbound(
            &app_state.db_pool,
            payload.transaction_ids,
            payload.note.as_deref(),
        )
        .await?;
    Ok((StatusCode::OK, Json(transactions)))
}
