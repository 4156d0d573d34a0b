// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only catalog endpoints proxied to the data service.

use axum::{extract::State, Json};
use serde_json::Value;

use super::envelope::Payload;
use crate::error::ApiError;
use crate::models::{DocumentsRequest, NavHistoryFilter};
use crate::state::AppState;

/// List all schemes.
#[utoipa::path(
    get,
    path = "/api/schemes",
    tag = "Catalog",
    responses(
        (status = 200, description = "Scheme rows"),
        (status = 500, description = "Data service error"),
    )
)]
pub async fn list_schemes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.data_api.schemes().await?))
}

/// List active document categories.
#[utoipa::path(
    get,
    path = "/api/document-categories",
    tag = "Catalog",
    responses(
        (status = 200, description = "Active categories"),
        (status = 500, description = "Data service error"),
    )
)]
pub async fn list_document_categories(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.data_api.document_categories().await?))
}

/// Active documents of one category, with sub-categories embedded.
///
/// A missing or non-positive `document_category_id` yields an empty list.
#[utoipa::path(
    post,
    path = "/api/documents",
    tag = "Catalog",
    request_body = DocumentsRequest,
    responses(
        (status = 200, description = "Document rows"),
        (status = 400, description = "Invalid payload"),
        (status = 500, description = "Data service error"),
    )
)]
pub async fn list_documents(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<Json<Value>, ApiError> {
    let request: DocumentsRequest = payload
        .and_then(|value| serde_json::from_value(value).ok())
        .ok_or_else(|| ApiError::bad_request("Invalid payload"))?;

    match request.document_category_id {
        Some(id) if id > 0 => Ok(Json(state.data_api.documents(id).await?)),
        _ => Ok(Json(Value::Array(Vec::new()))),
    }
}

/// NAV history, optionally bounded by `FromDate` / `ToDate`.
#[utoipa::path(
    post,
    path = "/api/nav-history",
    tag = "Catalog",
    request_body(content = NavHistoryFilter, description = "Optional date window"),
    responses(
        (status = 200, description = "NAV history rows"),
        (status = 500, description = "Data service error"),
    )
)]
pub async fn nav_history(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<Json<Value>, ApiError> {
    let filter: NavHistoryFilter = payload
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();

    Ok(Json(state.data_api.nav_history(&filter).await?))
}
