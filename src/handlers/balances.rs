// src/handlers/balances.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceFilter {
    pub product_unit_id: Option<Uuid>,
    pub warehouse_id: Option<Uuid>,
    pub stock_location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripleQuery {
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustBalancePayload {
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    #[validate(range(min = 0, message = "A quantidade contada não pode ser negativa."))]
    pub new_quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductStockTotals {
    pub product_unit_id: Uuid,
    pub total_quantity: i32,
    pub total_available: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAvailabilityQuery {
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityCheckResult {
    pub is_available: bool,
    pub requested_quantity: i32,
    pub available_from_balance: i32,
    pub available_from_lots: i32,
    pub shortage_quantity: i32,
}

#[utoipa::path(
    get,
    path = "/api/stock-balance",
    responses((status = 200, body = [crate::models::stock::StockBalance]))
)]
pub async fn list_balances(
    State(app_state): State<AppState>,
    Query(filter): Query<BalanceFilter>,
) -> Result<impl IntoResponse, AppError> {
    let balances = app_state
        .balance_service
        .list(
            filter.product_unit_id,
            filter.warehouse_id,
            filter.stock_location_id,
        )
        .await?;
    Ok((StatusCode::OK, Json(balances)))
}

#[utoipa::path(
    get,
    path = "/api/stock-balance/context",
    responses((status = 200, body = crate::models::stock::StockBalance))
)]
pub async fn get_balance_by_triple(
    State(app_state): State<AppState>,
    Query(query): Query<TripleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let balance = app_state
        .balance_service
        .get_by_triple(
            &app_state.db_pool,
            query.product_unit_id,
            query.warehouse_id,
            query.stock_location_id,
        )
        .await?
        .ok_or(AppError::StockBalanceNotFound {
            product_unit_id: query.product_unit_id,
            warehouse_id: query.warehouse_id,
            stock_location_id: query.stock_location_id,
        })?;
    Ok((StatusCode::OK, Json(balance)))
}

/// Fotografia consultiva da disponibilidade (agregado + soma dos lotes).
/// A checagem que vale acontece dentro da transação travada da reserva.
#[utoipa::path(
    get,
    path = "/api/stock-balance/availability",
    responses((status = 200, body = crate::services::reservation_service::AvailableQuantityInfo))
)]
pub async fn get_availability_info(
    State(app_state): State<AppState>,
    Query(query): Query<TripleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let info = app_state
        .reservation_service
        .get_available_quantity_info(
            &app_state.db_pool,
            query.product_unit_id,
            query.warehouse_id,
            query.stock_location_id,
        )
        .await?;
    Ok((StatusCode::OK, Json(info)))
}

#[utoipa::path(
    get,
    path = "/api/stock-balance/product/{id}/totals",
    responses((status = 200, body = ProductStockTotals))
)]
pub async fn get_product_totals(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let total_quantity = app_state.balance_service.total_quantity_by_product(id).await?;
    let total_available = app_state
        .balance_service
        .total_available_by_product(id)
        .await?;
    Ok((
        StatusCode::OK,
        Json(ProductStockTotals {
            product_unit_id: id,
            total_quantity,
            total_available,
        }),
    ))
}

/// Checagem consultiva de suficiência para uma quantidade pedida, com os
/// números da falta quando não há estoque.
#[utoipa::path(
    get,
    path = "/api/stock-balance/availability/check",
    responses((status = 200, body = AvailabilityCheckResult))
)]
pub async fn check_availability(
    State(app_state): State<AppState>,
    Query(query): Query<CheckAvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let is_available = app_state
        .reservation_service
        .check_available_quantity(
            &app_state.db_pool,
            query.product_unit_id,
            query.warehouse_id,
            query.stock_location_id,
            query.quantity,
        )
        .await?;
    let info = app_state
        .reservation_service
        .get_available_quantity_info(
            &app_state.db_pool,
            query.product_unit_id,
            query.warehouse_id,
            query.stock_location_id,
        )
        .await?;
    Ok((
        StatusCode::OK,
        Json(AvailabilityCheckResult {
            is_available,
            requested_quantity: query.quantity,
            available_from_balance: info.available_from_balance,
            available_from_lots: info.available_from_lots,
            shortage_quantity: (query.quantity - info.available_from_lots).max(0),
        }),
    ))
}

/// Correção manual do saldo (valor absoluto). Para correção com trilha de
/// auditoria no razão, use o ajuste da API de transações.
#[utoipa::path(
    post,
    path = "/api/stock-balance/adjust",
    request_body = AdjustBalancePayload,
    responses((status = 200, body = crate::models::stock::StockBalance))
)]
pub async fn adjust_balance(
    State(app_state): State<AppState>,
    Json(payload): Json<AdjustBalancePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let balance = app_state
        .balance_service
        .adjust(
            &app_state.db_pool,
            payload.product_unit_id,
            payload.warehouse_id,
            payload.stock_location_id,
            payload.new_quantity,
        )
        .await?;
    Ok((StatusCode::OK, Json(balance)))
}
