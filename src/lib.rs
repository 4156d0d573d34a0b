// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TPF Gateway - Encrypted Backend-for-Frontend
//!
//! Sits between the browser clients and a PostgREST data service. Request
//! bodies may arrive AES-encrypted; every `/api` response is encrypted with
//! the same shared key.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and the response envelope (Axum)
//! - `auth` - HS256 token issuing, bearer verification, password checks
//! - `crypto` - AES-128-CBC codec and the inbound payload fallback chain
//! - `store` - user/role/authorization lookups (Postgres)
//! - `providers` - PostgREST client and SMTP mail

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod models;
pub mod providers;
pub mod state;
pub mod store;
