// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token scopes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a token was issued for.
///
/// - `Public` - anonymous browser sessions (`GET /api/token`)
/// - `Service` - calls from this gateway to the data service
/// - `User` - tokens returned by a successful login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Public,
    Service,
    User,
}

impl Scope {
    /// Parse scope from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Scope> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Some(Scope::Public),
            "service" => Some(Scope::Service),
            "user" => Some(Scope::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Public => "public",
            Scope::Service => "service",
            Scope::User => "user",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
