// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;

use crate::auth::{Auth, AuthenticatedUser};

/// Get the caller's identity as carried by their token.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Token principal", body = AuthenticatedUser),
        (status = 401, description = "Unauthorized: invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(user): Auth) -> Json<AuthenticatedUser> {
    Json(user)
}
