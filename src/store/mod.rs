// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Directory Store
//!
//! Read-only access to the user/role/authorization tables that the gateway
//! needs at login and when choosing mail recipients. The schema is owned by
//! the data service; this crate never writes to it.
//!
//! ## Tables
//!
//! ```text
//! tpf_users(id, email, password, role_id, first_name, last_name)
//! tpf_role_authorizations(role_id, authorization_id)
//! tpf_authorizations(id, resource_name, name, attribute_name, locale_en)
//! tpf_schemes(id, scheme_name, modified_nav, modified_nav_date, ...)
//! ```
//!
//! Nothing is cached: every call reads fresh rows.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Authorization, SchemeRecord, UserRecord};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};

/// Authorization granting NAV update mails.
pub const UPDATE_SCHEMES_STATUS: &str = "update_schemes_status";

/// Authorization granting contact form mails.
pub const RECEIVE_MAIL_ON_CONTACT_US: &str = "receive_mail_on_contact_us";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Look up a user by exact email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>>;

    /// Authorizations granted to a role, ordered by id, without duplicates.
    ///
    /// `None` or a role without grants yields an empty list.
    async fn authorizations_for_role(&self, role_id: Option<i32>) -> StoreResult<Vec<Authorization>>;

    /// Emails of users whose role grants the named authorization, ordered by user id.
    async fn recipients_with_authorization(&self, name: &str) -> StoreResult<Vec<String>>;

    /// Schemes with the given ids, ordered by id. Unknown ids are skipped.
    async fn schemes_by_ids(&self, ids: &[i32]) -> StoreResult<Vec<SchemeRecord>>;

    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> StoreResult<()>;
}
