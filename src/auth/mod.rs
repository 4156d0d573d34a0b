// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Token issuing and bearer verification for the gateway.
//!
//! ## Auth Flow
//!
//! 1. Browser fetches a `public` token from `GET /api/token`, or logs in with
//!    `POST /api/login` (email + bcrypt password check against `tpf_users`)
//! 2. Login returns a `user` token plus the permission list of the user's role
//! 3. Protected endpoints expect `Authorization: Bearer <token>`
//! 4. The gateway verifies the HS256 signature and expiry (no leeway)
//!
//! ## Security
//!
//! - Tokens are stateless; there is no revocation list
//! - Unknown email and wrong password produce the same response

pub mod claims;
pub mod error;
pub mod extractor;
pub mod password;
pub mod scope;
pub mod tokens;

pub use claims::{AuthenticatedUser, TokenClaims, TokenSubject};
pub use error::AuthError;
pub use extractor::Auth;
pub use scope::Scope;
pub use tokens::{TokenExpiry, TokenIssuer};
