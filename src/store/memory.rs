// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory directory store.
//!
//! Used by tests, and as an empty placeholder when the gateway starts
//! without `DATABASE_URL` (every login then fails with invalid credentials).

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use super::{DirectoryStore, StoreResult};
use crate::models::{Authorization, SchemeRecord, UserRecord};

#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    users: BTreeMap<i32, UserRecord>,
    authorizations: BTreeMap<i32, Authorization>,
    grants: BTreeSet<(i32, i32)>,
    schemes: BTreeMap<i32, SchemeRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&mut self, user: UserRecord) {
        self.users.insert(user.id, user);
    }

    pub fn insert_authorization(&mut self, authorization: Authorization) {
        self.authorizations.insert(authorization.id, authorization);
    }

    /// Grant an authorization to a role (idempotent).
    pub fn grant(&mut self, role_id: i32, authorization_id: i32) {
        self.grants.insert((role_id, authorization_id));
    }

    pub fn insert_scheme(&mut self, scheme: SchemeRecord) {
        self.schemes.insert(scheme.id, scheme);
    }

    fn role_grants(&self, role_id: i32) -> impl Iterator<Item = &Authorization> {
        self.grants
            .iter()
            .filter(move |(role, _)| *role == role_id)
            .filter_map(|(_, auth_id)| self.authorizations.get(auth_id))
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.values().find(|user| user.email == email).cloned())
    }

    async fn authorizations_for_role(&self, role_id: Option<i32>) -> StoreResult<Vec<Authorization>> {
        let Some(role_id) = role_id else {
            return Ok(Vec::new());
        };

        let mut granted: Vec<Authorization> = self.role_grants(role_id).cloned().collect();
        granted.sort_by_key(|auth| auth.id);
        granted.dedup_by_key(|auth| auth.id);
        Ok(granted)
    }

    async fn recipients_with_authorization(&self, name: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .users
            .values()
            .filter(|user| {
                user.role_id
                    .is_some_and(|role| self.role_grants(role).any(|auth| auth.name == name))
            })
            .map(|user| user.email.clone())
            .collect())
    }

    async fn schemes_by_ids(&self, ids: &[i32]) -> StoreResult<Vec<SchemeRecord>> {
        Ok(self
            .schemes
            .values()
            .filter(|scheme| ids.contains(&scheme.id))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
