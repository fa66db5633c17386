// src/handlers/stocktakings.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::stocktaking::{Stocktaking, StocktakingDetail},
    services::stocktaking_service::StocktakingDetailPayload,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStocktakingPayload {
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    pub stocktaking_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StocktakingWithDetails {
    #[serde(flatten)]
    pub stocktaking: Stocktaking,
    pub details: Vec<StocktakingDetail>,
}

#[utoipa::path(
    post,
    path = "/api/stocktakings",
    request_body = CreateStocktakingPayload,
    responses((status = 201, body = crate::models::stocktaking::Stocktaking))
)]
pub async fn create_stocktaking(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateStocktakingPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let stocktaking = app_state
        .stocktaking_service
        .create(
            &app_state.db_pool,
            payload.warehouse_id,
            payload.stock_location_id,
            payload.stocktaking_date,
            payload.note.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(stocktaking)))
}

#[utoipa::path(
    get,
    path = "/api/stocktakings",
    responses((status = 200, body = [crate::models::stocktaking::Stocktaking]))
)]
pub async fn list_stocktakings(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let stocktakings = app_state.stocktaking_service.list_all().await?;
    Ok((StatusCode::OK, Json(stocktakings)))
}

#[utoipa::path(
    get,
    path = "/api/stocktakings/{id}",
    responses((status = 200, body = StocktakingWithDetails))
)]
pub async fn get_stocktaking(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (stocktaking, details) = app_state
        .stocktaking_service
        .get_by_id(&app_state.db_pool, id)
        .await?;
    Ok((
        StatusCode::OK,
        Json(StocktakingWithDetails {
            stocktaking,
            details,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/stocktakings/{id}/details",
    request_body = StocktakingDetailPayload,
    responses((status = 201, body = crate::models::stocktaking::StocktakingDetail))
)]
pub async fn add_detail(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StocktakingDetailPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let detail = app_state
        .stocktaking_service
        .add_detail(&app_state.db_pool, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Confirma a contagem. Com corpo, as linhas enviadas são gravadas e usadas;
/// sem corpo, valem as linhas já registradas.
#[utoipa::path(
    post,
    path = "/api/stocktakings/{id}/confirm",
    request_body = [StocktakingDetailPayload],
    responses((status = 200, body = crate::models::stocktaking::Stocktaking))
)]
pub async fn confirm_stocktaking(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<Vec<StocktakingDetailPayload>>>,
) -> Result<impl IntoResponse, AppError> {
    let stocktaking = match payload {
        Some(Json(details)) if !details.is_empty() => {
            for detail in &details {
                detail.validate()?;
            }
            app_state
                .stocktaking_service
                .confirm_with_payload(&app_state.db_pool, id, details)
                .await?
        }
        _ => {
            app_state
                .stocktaking_service
                .confirm(&app_state.db_pool, id)
                .await?
        }
    };
    Ok((StatusCode::OK, Json(stocktaking)))
}

#[utoipa::path(
    post,
    path = "/api/stocktakings/{id}/cancel",
    responses((status = 200, body = crate::models::stocktaking::Stocktaking))
)]
pub async fn cancel_stocktaking(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let stocktaking = app_state
        .stocktaking_service
        .cancel(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(stocktaking)))
}
