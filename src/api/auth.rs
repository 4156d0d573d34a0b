// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuing and login.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use super::envelope::Payload;
use crate::auth::{password::verify_password, AuthError, Scope, TokenSubject};
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, UserSummary};
use crate::state::AppState;

/// Issue a short-lived `public` token for anonymous clients.
#[utoipa::path(
    get,
    path = "/api/token",
    tag = "Auth",
    responses(
        (status = 200, description = "Encrypted JSON string holding the token", body = String),
    )
)]
pub async fn issue_public_token(State(state): State<AppState>) -> Result<Json<String>, AuthError> {
    let token = state.tokens.issue(TokenSubject::default(), Scope::Public)?;
    Ok(Json(token))
}

/// Exchange email and password for a `user` token and the role's permissions.
///
/// Unknown email and wrong password are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "email and password required"),
        (status = 401, description = "invalid credentials"),
        (status = 500, description = "server error"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<Json<LoginResponse>, Response> {
    let request: LoginRequest = payload
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();

    let (Some(email), Some(password)) = (
        request.email.filter(|e| !e.trim().is_empty()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("email and password required").into_response());
    };

    let user = state
        .store
        .find_user_by_email(email.trim())
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    let stored_hash = user.as_ref().map(|u| u.password.clone());
    let verified = verify_password(password, stored_hash).await;
    let user = match user {
        Some(user) if verified => user,
        _ => return Err(AuthError::InvalidCredentials.into_response()),
    };

    let access = state
        .store
        .authorizations_for_role(user.role_id)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    let token = state
        .tokens
        .issue(TokenSubject::web_user(user.id, user.email.clone()), Scope::User)
        .map_err(IntoResponse::into_response)?;

    info!(user_id = user.id, permissions = access.len(), "User logged in");

    Ok(Json(LoginResponse {
        token,
        access,
        user: UserSummary::from(&user),
    }))
}
