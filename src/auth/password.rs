// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password verification against stored bcrypt hashes.

use std::sync::LazyLock;

use tracing::warn;

/// Cost used for the stand-in hash; matches the cost of seeded user hashes.
const DUMMY_COST: u32 = 8;

/// Hash checked when the email is unknown, so both failure paths do the same work.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("tpf-gateway-dummy-password", DUMMY_COST).ok());

/// Check `password` against `stored_hash`.
///
/// With `None` (no such user) a dummy hash is verified and `false` returned.
/// Runs on the blocking pool since bcrypt is CPU-bound.
pub async fn verify_password(password: String, stored_hash: Option<String>) -> bool {
    let result = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => bcrypt::verify(&password, &hash).unwrap_or_else(|e| {
            warn!(error = %e, "Stored password hash is not valid bcrypt");
            false
        }),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = bcrypt::verify(&password, dummy);
            }
            false
        }
    })
    .await;

    result.unwrap_or(false)
}
