// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request decoding and response encryption for `/api`.
//!
//! - [`Payload`] reads a request body in any accepted shape and yields the
//!   decoded JSON value (or `None`).
//! - [`encrypt_responses`] replaces every response body with the JSON string
//!   of its ciphertext, unless plain mode is requested.

use axum::{
    body::{to_bytes, Body},
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::crypto::{normalize, RawPayload};
use crate::error::ApiError;
use crate::state::AppState;

/// Largest request body read by [`Payload`].
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Query parameter that disables response encryption.
pub const RAW_QUERY_PARAM: &str = "raw";

/// Header that disables response encryption.
pub const RETURN_PLAIN_HEADER: &str = "x-return-plain";

/// Decoded request body. `None` when the body is empty or undecodable.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(pub Option<Value>);

impl FromRequest<AppState> for Payload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|e| {
                if exceeds_limit(&e) {
                    ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Payload too large")
                } else {
                    warn!(error = %e, "Failed to read request body");
                    ApiError::bad_request("Failed to read request body")
                }
            })?;

        let raw = RawPayload::from_body(content_type.as_deref(), &body);
        Ok(Payload(normalize(&state.cipher, raw)))
    }
}

fn exceeds_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// True when the caller asked for a plaintext response.
pub fn wants_plain(query: Option<&str>, headers: &HeaderMap) -> bool {
    let by_query = query.is_some_and(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .any(|(key, value)| key == RAW_QUERY_PARAM && is_truthy(&value))
    });

    let by_header = headers
        .get(RETURN_PLAIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_truthy);

    by_query || by_header
}

/// Encrypt the response body of every `/api` request.
pub async fn encrypt_responses(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let plain = state.plain_responses || wants_plain(request.uri().query(), request.headers());
    let response = next.run(request).await;
    if plain {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if bytes.is_empty() {
        return Response::from_parts(parts, Body::empty());
    }

    let ciphertext = state.cipher.encrypt(&String::from_utf8_lossy(&bytes));
    let wrapped = match serde_json::to_vec(&ciphertext) {
        Ok(wrapped) => wrapped,
        Err(e) => {
            error!(error = %e, "Failed to serialize ciphertext");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    debug!(status = parts.status.as_u16(), plain_len = bytes.len(), "Encrypted response");
    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(wrapped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::{middleware, routing::post, Json, Router};
    use serde_json::json;
    use tower::ServiceExt;

    async fn echo(Payload(value): Payload) -> Json<Value> {
        Json(value.unwrap_or(Value::Null))
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/echo", post(echo))
            .layer(middleware::from_fn_with_state(state.clone(), encrypt_responses))
            .with_state(state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn only_length_limit_errors_count_as_oversized() {
        let oversized = to_bytes(Body::from(vec![b'a'; 16]), 4).await.unwrap_err();
        assert!(exceeds_limit(&oversized));

        let reset = axum::Error::new(std::io::Error::other("connection reset"));
        assert!(!exceeds_limit(&reset));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let response = app(AppState::for_tests())
            .oneshot(
                Request::post("/echo?raw=1")
                    .header("content-type", "text/plain")
                    .body(Body::from(vec![b'a'; MAX_BODY_BYTES + 1]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_text(response).await, r#"{"error":"Payload too large"}"#);
    }

    #[test]
    fn plain_mode_flags() {
        let empty = HeaderMap::new();
        assert!(wants_plain(Some("raw=1"), &empty));
        assert!(wants_plain(Some("a=b&raw=TRUE"), &empty));
        assert!(!wants_plain(Some("raw=0"), &empty));
        assert!(!wants_plain(None, &empty));

        let mut headers = HeaderMap::new();
        headers.insert(RETURN_PLAIN_HEADER, HeaderValue::from_static("true"));
        assert!(wants_plain(None, &headers));
    }

    #[tokio::test]
    async fn responses_are_encrypted_json_strings() {
        let state = AppState::for_tests();
        let response = app(state.clone())
            .oneshot(
                Request::post("/echo")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"a":1}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let ciphertext: String = serde_json::from_str(&body_text(response).await).unwrap();
        let plaintext = state.cipher.decrypt(&ciphertext).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&plaintext).unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn wrapped_ciphertext_request_is_decoded() {
        let state = AppState::for_tests();
        let data = state.cipher.encrypt(r#"{"email":"a@example.com"}"#);
        let response = app(state)
            .oneshot(
                Request::post("/echo?raw=1")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "data": data }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_text(response).await, r#"{"email":"a@example.com"}"#);
    }

    #[tokio::test]
    async fn plain_header_skips_encryption() {
        let response = app(AppState::for_tests())
            .oneshot(
                Request::post("/echo")
                    .header(RETURN_PLAIN_HEADER, "1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_text(response).await, "null");
    }

    #[tokio::test]
    async fn test_environment_skips_encryption() {
        let state = AppState::for_tests().with_plain_responses(true);
        let response = app(state)
            .oneshot(
                Request::post("/echo")
                    .header("content-type", "text/plain")
                    .body(Body::from("[1,2]"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_text(response).await, "[1,2]");
    }
}
