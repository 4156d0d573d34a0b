// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for the PostgREST data service.
//!
//! Reads are plain `GET`s with PostgREST filter syntax (`col=eq.value`).
//! Contact submissions are the only write. No retries.

use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::TokenIssuer;
use crate::models::NavHistoryFilter;

pub const DEFAULT_API_DOMAIN: &str = "http://localhost:3000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum DataApiError {
    #[error("data service request failed: {0}")]
    Request(String),

    #[error("data service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("data service response was invalid: {0}")]
    InvalidResponse(String),

    #[error("data service token could not be issued: {0}")]
    Token(String),
}

#[derive(Debug, Clone)]
pub struct DataApiClient {
    base_url: String,
    http: Client,
    /// Present when outbound writes must carry a `service` token.
    service_tokens: Option<TokenIssuer>,
}

impl DataApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DataApiError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DataApiError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            service_tokens: None,
        })
    }

    /// Sign outbound writes with a `service` scope token from `issuer`.
    pub fn with_service_tokens(mut self, issuer: TokenIssuer) -> Self {
        self.service_tokens = Some(issuer);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET` a path (with optional query string) and decode the JSON body.
    pub async fn get_json(&self, path_with_query: &str) -> Result<Value, DataApiError> {
        self.get_with_query(path_with_query, &[]).await
    }

    async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, DataApiError> {
        debug!(path, "Data service GET");
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| DataApiError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DataApiError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(DataApiError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|e| DataApiError::InvalidResponse(e.to_string()))
    }

    pub async fn schemes(&self) -> Result<Value, DataApiError> {
        self.get_json("/tpf_schemes").await
    }

    pub async fn document_categories(&self) -> Result<Value, DataApiError> {
        self.get_json("/tpf_document_categories?is_active=eq.true").await
    }

    /// Active documents of a category, with their sub-categories embedded.
    pub async fn documents(&self, document_category_id: i64) -> Result<Value, DataApiError> {
        self.get_with_query(
            "/tpf_documents",
            &[
                ("document_category_id", format!("eq.{document_category_id}")),
                ("is_active", "eq.true".to_string()),
                ("select", "*,tpf_document_sub_categories(*)".to_string()),
            ],
        )
        .await
    }

    /// NAV history rows inside the optional date window.
    pub async fn nav_history(&self, filter: &NavHistoryFilter) -> Result<Value, DataApiError> {
        let mut query = Vec::new();
        if let Some(from) = filter.from_date.as_deref().filter(|d| !d.is_empty()) {
            query.push(("nav_date", format!("gte.{from}")));
        }
        if let Some(to) = filter.to_date.as_deref().filter(|d| !d.is_empty()) {
            query.push(("nav_date", format!("lte.{to}")));
        }
        self.get_with_query("/tpf_nav_history", &query).await
    }

    /// Insert a contact submission and return what the service sent back.
    ///
    /// The result is the parsed JSON representation, the raw text if it is not
    /// JSON, or `{status, ok}` when the body is empty.
    pub async fn insert_contact(&self, submission: &Value) -> Result<Value, DataApiError> {
        let mut request = self
            .http
            .post(self.url("/tpf_contact_us"))
            .header(header::ACCEPT, "application/json")
            .header("Prefer", "return=representation")
            .json(submission);

        if let Some(issuer) = &self.service_tokens {
            let token = issuer
                .service_token()
                .map_err(|e| DataApiError::Token(e.to_string()))?;
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DataApiError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DataApiError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(DataApiError::Status { status, body: text });
        }

        info!(status = status.as_u16(), "Contact submission stored");

        if text.trim().is_empty() {
            return Ok(serde_json::json!({ "status": status.as_u16(), "ok": true }));
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
