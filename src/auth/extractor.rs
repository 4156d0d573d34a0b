// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated callers.
//!
//! Every protected endpoint reads the token from the `Authorization: Bearer`
//! header and nowhere else:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extractor for authenticated callers.
///
/// Rejects with [`AuthError`] (401) when the header is missing, is not a
/// bearer credential, or carries a token that fails verification.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = state.tokens.decode(token).map_err(|e| {
            debug!(error_code = e.error_code(), "Rejected bearer token");
            e
        })?;

        Ok(Auth(AuthenticatedUser::from_claims(claims)))
    }
}

/// Extract the raw token from `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Scope, TokenSubject};
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/users/me");
        if let Some(value) = value {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let state = AppState::for_tests();
        let mut parts = parts_with_header(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_non_bearer_scheme() {
        let state = AppState::for_tests();
        let mut parts = parts_with_header(Some("Basic dXNlcjpwYXNz"));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_accepts_issued_token() {
        let state = AppState::for_tests();
        let token = state
            .tokens
            .issue(TokenSubject::web_user(5, "ops@example.com"), Scope::User)
            .unwrap();
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.user_id, Some(5));
        assert_eq!(user.scope, Scope::User);
    }

    #[tokio::test]
    async fn auth_extractor_accepts_lowercase_scheme() {
        let state = AppState::for_tests();
        let token = state.tokens.issue(TokenSubject::default(), Scope::Public).unwrap();
        let mut parts = parts_with_header(Some(&format!("bearer {token}")));

        assert!(Auth::from_request_parts(&mut parts, &state).await.is_ok());
    }

    #[tokio::test]
    async fn auth_extractor_rejects_tampered_token() {
        let state = AppState::for_tests();
        let token = state.tokens.issue(TokenSubject::default(), Scope::Public).unwrap();
        let mut parts = parts_with_header(Some(&format!("Bearer {token}x")));

        assert!(Auth::from_request_parts(&mut parts, &state).await.is_err());
    }
}
