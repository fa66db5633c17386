// src/handlers/warehouses.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehousePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
    pub zone: Option<String>,
    pub aisle: Option<String>,
    pub rack: Option<String>,
    pub level: Option<String>,
    pub position: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/warehouses",
    request_body = CreateWarehousePayload,
    responses((status = 201, body = crate::models::warehouse::Warehouse))
)]
pub async fn create_warehouse(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateWarehousePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let warehouse = app_state
        .warehouse_service
        .create_warehouse(&app_state.db_pool, &payload.name, payload.address.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

#[utoipa::path(
    get,
    path = "/api/warehouses",
    responses((status = 200, body = [crate::models::warehouse::Warehouse]))
)]
pub async fn list_warehouses(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let warehouses = app_state.warehouse_service.list_warehouses().await?;
    Ok((StatusCode::OK, Json(warehouses)))
}

#[utoipa::path(
    get,
    path = "/api/warehouses/{id}",
    responses((status = 200, body = crate::models::warehouse::Warehouse))
)]
pub async fn get_warehouse(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let warehouse = app_state
        .warehouse_service
        .get_warehouse(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(warehouse)))
}

#[utoipa::path(
    delete,
    path = "/api/warehouses/{id}",
    responses((status = 200, body = crate::models::warehouse::Warehouse))
)]
pub async fn deactivate_warehouse(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let warehouse = app_state
        .warehouse_service
        .deactivate_warehouse(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(warehouse)))
}

#[utoipa::path(
    post,
    path = "/api/warehouses/{id}/locations",
    request_body = CreateLocationPayload,
    responses((status = 201, body = crate::models::warehouse::StockLocation))
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateLocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let location = app_state
        .warehouse_service
        .create_location(
            &app_state.db_pool,
            id,
            &payload.name,
            payload.description.as_deref(),
            payload.zone.as_deref(),
            payload.aisle.as_deref(),
            payload.rack.as_deref(),
            payload.level.as_deref(),
            payload.position.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

#[utoipa::path(
    get,
    path = "/api/warehouses/{id}/locations",
    responses((status = 200, body = [crate::models::warehouse::StockLocation]))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let locations = app_state.warehouse_service.list_locations(id).await?;
    Ok((StatusCode::OK, Json(locations)))
}

#[utoipa::path(
    get,
    path = "/api/stock-locations/{id}",
    responses((status = 200, body = crate::models::warehouse::StockLocation))
)]
pub async fn get_location(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let location = app_state
        .warehouse_service
        .get_location(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(location)))
}

#[utoipa::path(
    delete,
    path = "/api/stock-locations/{id}",
    responses((status = 200, body = crate::models::warehouse::StockLocation))
)]
pub async fn deactivate_location(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let location = app_state
        .warehouse_service
        .deactivate_location(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(location)))
}
