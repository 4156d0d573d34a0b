// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Postgres-backed directory store.
//!
//! ## Security
//!
//! - `DATABASE_URL` may contain credentials; it is never logged
//! - All queries are static SQL with bound parameters
//!
//! ## Concurrency
//!
//! Handlers share one `PgPool`; pool size and acquire timeout bound how long
//! a request waits for a connection before failing.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use super::{DirectoryStore, StoreResult};
use crate::models::{Authorization, SchemeRecord, UserRecord};

/// Connection settings for the directory database.
#[derive(Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish_non_exhaustive()
    }
}

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Build a lazily-connecting pool; the first query opens the connection.
    pub fn connect_lazy(config: &PostgresConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::from_str(&config.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        info!(
            max_connections = config.max_connections,
            "Directory database pool configured"
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl DirectoryStore for PostgresStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, role_id, first_name, last_name, password \
             FROM public.tpf_users WHERE email = $1 LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn authorizations_for_role(&self, role_id: Option<i32>) -> StoreResult<Vec<Authorization>> {
        let Some(role_id) = role_id else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, Authorization>(
            "SELECT a.id, a.name, a.attribute_name, a.resource_name, a.locale_en \
             FROM public.tpf_authorizations a \
             WHERE a.id IN ( \
                 SELECT ra.authorization_id FROM public.tpf_role_authorizations ra \
                 WHERE ra.role_id = $1 \
             ) \
             ORDER BY a.id",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn recipients_with_authorization(&self, name: &str) -> StoreResult<Vec<String>> {
        let emails = sqlx::query_scalar::<_, String>(
            "SELECT u.email FROM public.tpf_users u \
             WHERE u.role_id IN ( \
                 SELECT ra.role_id FROM public.tpf_role_authorizations ra \
                 JOIN public.tpf_authorizations a ON ra.authorization_id = a.id \
                 WHERE a.name = $1 \
             ) \
             ORDER BY u.id",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }

    async fn schemes_by_ids(&self, ids: &[i32]) -> StoreResult<Vec<SchemeRecord>> {
        let rows = sqlx::query_as::<_, SchemeRecord>(
            "SELECT id, scheme_name, \
                    modified_nav::text AS modified_nav, \
                    modified_nav_date::text AS modified_nav_date \
             FROM public.tpf_schemes WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
