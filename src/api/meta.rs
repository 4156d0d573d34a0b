// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Route listing and the `/api` fallback.

use axum::Json;

use super::ROUTES;
use crate::error::ApiError;
use crate::models::{RouteInfo, RouteList};

/// List the routes served under `/api`.
#[utoipa::path(
    get,
    path = "/api/routes",
    tag = "Meta",
    responses(
        (status = 200, description = "Registered routes", body = RouteList),
    )
)]
pub async fn list_routes() -> Json<RouteList> {
    let routes: Vec<RouteInfo> = ROUTES
        .iter()
        .map(|(method, path)| RouteInfo {
            method: method.to_string(),
            path: path.to_string(),
        })
        .collect();

    Json(RouteList {
        count: routes.len(),
        routes,
    })
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}
