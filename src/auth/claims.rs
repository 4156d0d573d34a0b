// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::scope::Scope;

/// Issuer stamped on every token this gateway signs.
pub const TOKEN_ISSUER: &str = "tpf-backend";

/// Database role assumed by the data service for logged-in users.
pub const WEB_USER_ROLE: &str = "web_user";

/// Caller-supplied part of a token; the issuer adds `iss`, `scope`, `iat`, `exp`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSubject {
    pub role: Option<String>,
    pub user_id: Option<i32>,
    pub email: Option<String>,
}

impl TokenSubject {
    /// Subject for a successful login.
    pub fn web_user(user_id: i32, email: impl Into<String>) -> Self {
        Self {
            role: Some(WEB_USER_ROLE.to_string()),
            user_id: Some(user_id),
            email: Some(email.into()),
        }
    }
}

/// Claims carried by tokens issued by this gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer (always [`TOKEN_ISSUER`])
    pub iss: String,

    /// What the token may be used for
    pub scope: Scope,

    /// Database role (login tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// User primary key (login tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,

    /// User email (login tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

/// Authenticated caller extracted from a bearer token.
///
/// This is the type handlers receive from the `Auth` extractor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Token scope
    pub scope: Scope,

    /// Database role, if the token came from a login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// User ID, if the token came from a login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,

    /// User email, if the token came from a login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Token expiration (Unix timestamp)
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Self {
        Self {
            scope: claims.scope,
            role: claims.role,
            user_id: claims.user_id,
            email: claims.email,
            expires_at: claims.exp,
        }
    }

    /// Whether the token identifies a logged-in user.
    pub fn is_user(&self) -> bool {
        self.scope == Scope::User && self.user_id.is_some()
    }
}
