// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response shapes used by the handlers, plus the records read
//! from the directory database. Payload types are `Deserialize` so they can
//! be read out of a normalized (decrypted) request body.
//!
//! ## Model Categories
//!
//! - **Directory**: users, authorizations, schemes
//! - **Login**: credentials and the login response
//! - **Notifications**: NAV update and contact submissions
//! - **Meta**: route listing

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// =============================================================================
// Directory Records
// =============================================================================

/// A named permission, granted to roles through `tpf_role_authorizations`.
///
/// Unique on `(resource_name, name, attribute_name, locale_en)`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, sqlx::FromRow)]
pub struct Authorization {
    pub id: i32,
    pub name: String,
    pub attribute_name: String,
    pub resource_name: String,
    /// English display label.
    pub locale_en: String,
}

/// A gateway user as stored in `tpf_users`.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i32,
    pub email: String,
    pub role_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    /// bcrypt hash
    pub password: String,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role_id", &self.role_id)
            .finish_non_exhaustive()
    }
}

/// Latest NAV values of a scheme, as rendered into update mails.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, sqlx::FromRow)]
pub struct SchemeRecord {
    pub id: i32,
    pub scheme_name: String,
    pub modified_nav: Option<String>,
    pub modified_nav_date: Option<String>,
}

// =============================================================================
// Login
// =============================================================================

/// Credentials posted to `/api/login`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Public view of the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role_id: Option<i32>,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role_id: user.role_id,
        }
    }
}

/// Successful login: a user token and the permissions of the user's role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub access: Vec<Authorization>,
    pub user: UserSummary,
}

// =============================================================================
// Catalog Queries
// =============================================================================

/// Date window for `/api/nav-history`. Dates are passed through verbatim.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, PartialEq, Eq)]
pub struct NavHistoryFilter {
    #[serde(rename = "FromDate", default)]
    pub from_date: Option<String>,
    #[serde(rename = "ToDate", default)]
    pub to_date: Option<String>,
}

/// Body of `/api/documents`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DocumentsRequest {
    /// Accepted as a number or a numeric string.
    #[serde(default, deserialize_with = "lenient_i64")]
    #[schema(value_type = Option<i64>)]
    pub document_category_id: Option<i64>,
}

// =============================================================================
// Notifications
// =============================================================================

/// Body of `/api/send-mail-nav-update`: one scheme id or several, each a
/// number or a numeric string.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NavUpdateRequest {
    #[serde(default, deserialize_with = "lenient_ids")]
    #[schema(value_type = Object)]
    pub id: Vec<i32>,
}

/// Outcome of a notification mail.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MailDispatchResponse {
    pub success: bool,
    pub message: String,
    pub emails: Vec<String>,
}

/// A contact form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ContactSubmission {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// Meta
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RouteList {
    pub count: usize,
    pub routes: Vec<RouteInfo>,
}

fn lenient_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accept `4`, `"4"` or nothing.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_id(&Value::deserialize(deserializer)?))
}

/// Accept `4`, `"4"`, or a list of either. Entries that are not ids are dropped.
fn lenient_ids<'de, D>(deserializer: D) -> Result<Vec<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    Ok(items
        .into_iter()
        .filter_map(lenient_id)
        .filter_map(|id| i32::try_from(id).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_category_accepts_numbers_and_strings() {
        let req: DocumentsRequest = serde_json::from_value(json!({"document_category_id": 3})).unwrap();
        assert_eq!(req.document_category_id, Some(3));

        let req: DocumentsRequest =
            serde_json::from_value(json!({"document_category_id": "12"})).unwrap();
        assert_eq!(req.document_category_id, Some(12));

        let req: DocumentsRequest =
            serde_json::from_value(json!({"document_category_id": "abc"})).unwrap();
        assert_eq!(req.document_category_id, None);

        let req: DocumentsRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.document_category_id, None);
    }

    #[test]
    fn scheme_ids_accept_one_or_many() {
        let req: NavUpdateRequest = serde_json::from_value(json!({"id": 4})).unwrap();
        assert_eq!(req.id, vec![4]);

        let req: NavUpdateRequest = serde_json::from_value(json!({"id": [1, 2]})).unwrap();
        assert_eq!(req.id, vec![1, 2]);
    }

    #[test]
    fn scheme_ids_accept_numeric_strings() {
        let req: NavUpdateRequest = serde_json::from_value(json!({"id": "7"})).unwrap();
        assert_eq!(req.id, vec![7]);

        let req: NavUpdateRequest = serde_json::from_value(json!({"id": ["1", 2, "x"]})).unwrap();
        assert_eq!(req.id, vec![1, 2]);

        let req: NavUpdateRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.id.is_empty());

        let req: NavUpdateRequest = serde_json::from_value(json!({"id": 5_000_000_000i64})).unwrap();
        assert!(req.id.is_empty());
    }

    #[test]
    fn nav_history_filter_uses_client_field_names() {
        let filter: NavHistoryFilter =
            serde_json::from_value(json!({"FromDate": "2025-01-01"})).unwrap();
        assert_eq!(filter.from_date.as_deref(), Some("2025-01-01"));
        assert_eq!(filter.to_date, None);
    }

    #[test]
    fn user_record_debug_hides_password_hash() {
        let user = UserRecord {
            id: 1,
            email: "ops@example.com".into(),
            role_id: Some(2),
            first_name: "Op".into(),
            last_name: "Erator".into(),
            password: "$2a$08$secret".into(),
        };
        assert!(!format!("{user:?}").contains("secret"));
    }
}
