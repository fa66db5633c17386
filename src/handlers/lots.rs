// src/handlers/lots.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, models::stock::LotStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripleQuery {
    pub product_unit_id: Uuid,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedQuery {
    pub product_unit_id: Uuid,
    pub warehouse_id: Option<Uuid>,
    pub stock_location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearExpiryQuery {
    /// Janela em dias a partir de hoje.
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLotPayload {
    pub expiry_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub supplier_name: Option<String>,
    pub supplier_batch_number: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLotStatusPayload {
    pub status: LotStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LotQuantityPayload {
    #[validate(range(min = 1, message = "A quantidade deve ser maior que zero."))]
    pub quantity: i32,
}

#[utoipa::path(
    get,
    path = "/api/lots/{id}",
    responses((status = 200, body = crate::models::stock::StockLot))
)]
pub async fn get_lot(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lot = app_state
        .lot_service
        .get_by_id(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(lot)))
}

#[utoipa::path(
    get,
    path = "/api/lots/by-number/{number}",
    responses((status = 200, body = crate::models::stock::StockLot))
)]
pub async fn get_lot_by_number(
    State(app_state): State<AppState>,
    Path(number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lot = app_state
        .lot_service
        .get_by_number(&app_state.db_pool, &number)
        .await?;
    Ok((StatusCode::OK, Json(lot)))
}

#[utoipa::path(
    get,
    path = "/api/lots",
    responses((status = 200, body = [crate::models::stock::StockLot]))
)]
pub async fn list_lots_by_triple(
    State(app_state): State<AppState>,
    Query(query): Query<TripleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let lots = app_state
        .lot_service
        .lots_by_triple(
            query.product_unit_id,
            query.warehouse_id,
            query.stock_location_id,
        )
        .await?;
    Ok((StatusCode::OK, Json(lots)))
}

/// Candidatos FEFO no escopo pedido (contexto exato, armazém, posição ou
/// global), na ordem em que seriam alocados.
#[utoipa::path(
    get,
    path = "/api/lots/available",
    responses((status = 200, body = [crate::models::stock::StockLot]))
)]
pub async fn list_available_lots(
    State(app_state): State<AppState>,
    Query(query): Query<ScopedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let lots = app_state
        .lot_service
        .available_lots_scoped(
            &app_state.db_pool,
            query.product_unit_id,
            query.warehouse_id,
            query.stock_location_id,
        )
        .await?;
    Ok((StatusCode::OK, Json(lots)))
}

#[utoipa::path(
    get,
    path = "/api/lots/near-expiry",
    responses((status = 200, body = [crate::models::stock::StockLot]))
)]
pub async fn list_lots_near_expiry(
    State(app_state): State<AppState>,
    Query(query): Query<NearExpiryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let lots = app_state
        .lot_service
        .lots_near_expiry(query.days.unwrap_or(30))
        .await?;
    Ok((StatusCode::OK, Json(lots)))
}

#[utoipa::path(
    get,
    path = "/api/lots/expired",
    responses((status = 200, body = [crate::models::stock::StockLot]))
)]
pub async fn list_expired_lots(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let lots = app_state.lot_service.expired_lots().await?;
    Ok((StatusCode::OK, Json(lots)))
}

#[utoipa::path(
    get,
    path = "/api/lots/reserved",
    responses((status = 200, body = [crate::models::stock::StockLot]))
)]
pub async fn list_reserved_lots(
    State(app_state): State<AppState>,
    Query(query): Query<TripleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let lots = app_state
        .lot_service
        .reserved_lots(
            query.product_unit_id,
            query.warehouse_id,
            query.stock_location_id,
        )
        .await?;
    Ok((StatusCode::OK, Json(lots)))
}

#[utoipa::path(
    get,
    path = "/api/lots/statistics",
    responses((status = 200, body = crate::services::lot_service::LotStatistics))
)]
pub async fn lot_statistics(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.lot_service.statistics().await?;
    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    put,
    path = "/api/lots/{id}",
    request_body = UpdateLotPayload,
    responses((status = 200, body = crate::models::stock::StockLot))
)]
pub async fn update_lot(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLotPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let lot = app_state
        .lot_service
        .update_details(
            &app_state.db_pool,
            id,
            payload.expiry_date,
            payload.manufacturing_date,
            payload.supplier_name,
            payload.supplier_batch_number,
            payload.note,
        )
        .await?;
    Ok((StatusCode::OK, Json(lot)))
}

#[utoipa::path(
    put,
    path = "/api/lots/{id}/status",
    request_body = UpdateLotStatusPayload,
    responses((status = 200, body = crate::models::stock::StockLot))
)]
pub async fn update_lot_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLotStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let lot = app_state
        .lot_service
        .update_status(&app_state.db_pool, id, payload.status)
        .await?;
    Ok((StatusCode::OK, Json(lot)))
}

/// Reserva direta em um lote específico (fora do fluxo de documentos).
#[utoipa::path(
    post,
    path = "/api/lots/{id}/reserve",
    request_body = LotQuantityPayload,
    responses((status = 200, body = crate::models::stock::StockLot))
)]
pub async fn reserve_lot(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LotQuantityPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let lot = app_state
        .lot_service
        .reserve(&app_state.db_pool, id, payload.quantity)
        .await?;
    Ok((StatusCode::OK, Json(lot)))
}

#[utoipa::path(
    post,
    path = "/api/lots/{id}/release",
    request_body = LotQuantityPayload,
    responses((status = 200, body = crate::models::stock::StockLot))
)]
pub async fn release_lot(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LotQuantityPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let lot = app_state
        .lot_service
        .release(&app_state.db_pool, id, payload.quantity)
        .await?;
    Ok((StatusCode::OK, Json(lot)))
}

#[utoipa::path(
    post,
    path = "/api/lots/{id}/consume",
    request_body = LotQuantityPayload,
    responses((status = 200, body = crate::models::stock::StockLot))
)]
pub async fn consume_lot(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LotQuantityPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let lot = app_state
        .lot_service
        .consume(&app_state.db_pool, id, payload.quantity)
        .await?;
    Ok((StatusCode::OK, Json(lot)))
}

/// Varredura de validade: marca como EXPIRED os lotes ativos vencidos.
#[utoipa::path(
    post,
    path = "/api/lots/mark-expired",
    responses((status = 200, body = [crate::models::stock::StockLot]))
)]
pub async fn mark_expired_lots(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let lots = app_state
        .lot_service
        .mark_expired(&app_state.db_pool)
        .await?;
    Ok((StatusCode::OK, Json(lots)))
}

#[utoipa::path(
    delete,
    path = "/api/lots/{id}",
    responses((status = 200, body = crate::models::stock::StockLot))
)]
pub async fn delete_lot(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lot = app_state
        .lot_service
        .delete(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(lot)))
}
