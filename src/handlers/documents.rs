// src/handlers/documents.rs

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
    models::document::DocumentType,
    services::document_service::{NewDocumentLine, UpdateDocumentLine},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentPayload {
    pub document_type: DocumentType,
    pub warehouse_id: Uuid,
    pub stock_location_id: Uuid,
    pub reference_number: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectPayload {
    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFilter {
    pub warehouse_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/stock-documents",
    request_body = CreateDocumentPayload,
    responses((status = 201, body = crate::models::document::StockDocument))
)]
pub async fn create_document(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateDocumentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let document = app_state
        .document_service
        .create(
            &app_state.db_pool,
            payload.document_type,
            payload.warehouse_id,
            payload.stock_location_id,
            payload.reference_number.as_deref(),
            payload.note.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

#[utoipa::path(
    get,
    path = "/api/stock-documents",
    responses((status = 200, body = [crate::models::document::StockDocument]))
)]
pub async fn list_documents(
    State(app_state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> Result<impl IntoResponse, AppError> {
    let documents = match filter.warehouse_id {
        Some(warehouse_id) => {
            app_state
                .document_service
                .list_by_warehouse(warehouse_id)
                .await?
        }
        None => app_state.document_service.list_all().await?,
    };
    Ok((StatusCode::OK, Json(documents)))
}

#[utoipa::path(
    get,
    path = "/api/stock-documents/{id}",
    responses((status = 200, body = crate::services::document_service::DocumentWithLines))
)]
pub async fn get_document(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = app_state
        .document_service
        .get_by_id(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(document)))
}

#[utoipa::path(
    post,
    path = "/api/stock-documents/{id}/lines",
    request_body = NewDocumentLine,
    responses((status = 201, body = crate::models::document::StockDocumentLine))
)]
#[axum::debug_handler]
pub async fn add_line(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewDocumentLine>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let line = app_state
        .document_service
        .add_line(&app_state.db_pool, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(line)))
}

#[utoipa::path(
    post,
    path = "/api/stock-documents/{id}/lines/bulk",
    request_body = [NewDocumentLine],
    responses((status = 201, body = [crate::models::document::StockDocumentLine]))
)]
pub async fn add_lines_bulk(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Vec<NewDocumentLine>>,
) -> Result<impl IntoResponse, AppError> {
    for line in &payload {
        line.validate()?;
    }
    let lines = app_state
        .document_service
        .add_lines_bulk(&app_state.db_pool, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(lines)))
}

#[utoipa::path(
    get,
    path = "/api/stock-documents/{id}/lines",
    responses((status = 200, body = [crate::models::document::StockDocumentLine]))
)]
pub async fn get_lines(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let lines = app_state
        .document_service
        .get_lines(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(lines)))
}

#[utoipa::path(
    put,
    path = "/api/stock-documents/lines/{lineId}",
    request_body = UpdateDocumentLine,
    responses((status = 200, body = crate::models::document::StockDocumentLine))
)]
pub async fn update_line(
    State(app_state): State<AppState>,
    Path(line_id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentLine>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let line = app_state
        .document_service
        .update_line(&app_state.db_pool, line_id, payload)
        .await?;
    Ok((StatusCode::OK, Json(line)))
}

#[utoipa::path(
    delete,
    path = "/api/stock-documents/lines/{lineId}",
    responses((status = 204))
)]
pub async fn delete_line(
    State(app_state): State<AppState>,
    Path(line_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .document_service
        .delete_line(&app_state.db_pool, line_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/stock-documents/{id}/approve",
    responses((status = 200, body = crate::models::document::StockDocument))
)]
pub async fn approve_document(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = app_state
        .document_service
        .approve(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(document)))
}

#[utoipa::path(
    post,
    path = "/api/stock-documents/{id}/cancel",
    responses((status = 200, body = crate::models::document::StockDocument))
)]
pub async fn cancel_document(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let document = app_state
        .document_service
        .cancel(&app_state.db_pool, id)
        .await?;
    Ok((StatusCode::OK, Json(document)))
}

#[utoipa::path(
    post,
    path = "/api/stock-documents/{id}/reject",
    request_body = RejectPayload,
    responses((status = 200, body = crate::models::document::StockDocument))
)]
pub async fn reject_document(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let document = app_state
        .document_service
        .reject(&app_state.db_pool, id, &payload.reason)
        .await?;
    Ok((StatusCode::OK, Json(document)))
}
