// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Inbound payload normalization.
//!
//! Clients send request bodies in several shapes depending on their version:
//! plain JSON, `{"data": "<ciphertext>"}` (as JSON or as a urlencoded form),
//! a bare ciphertext string, or base64-encoded JSON. [`normalize`] turns all
//! of them into one decoded JSON value, trying each interpretation in a
//! fixed order:
//!
//! 1. An array, or an object whose `data` is missing, null, empty or not a
//!    string, is already decoded and returned unchanged.
//! 2. A string, or the string in `data`, is decrypted; the plaintext is
//!    parsed as JSON, or returned as a string if it is not JSON.
//! 3. If decryption fails, the text is base64-decoded and handled the same way.
//! 4. Anything else yields `None`.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Value};
use tracing::debug;

use super::cipher::SymmetricCipher;

/// Field holding ciphertext in the wrapped envelope.
pub const DATA_FIELD: &str = "data";

/// A request body before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// No body at all.
    Absent,
    /// A body that was already parsed as JSON.
    Json(Value),
    /// A textual body that was not declared as JSON.
    Text(String),
    /// An opaque body.
    Bytes(Vec<u8>),
}

impl RawPayload {
    /// Classify a raw body using its declared content type.
    ///
    /// Urlencoded forms become a JSON object of string fields.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return RawPayload::Absent;
        }

        let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
        if content_type.starts_with("application/x-www-form-urlencoded") {
            let form: Map<String, Value> = url::form_urlencoded::parse(body)
                .into_owned()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            return RawPayload::Json(Value::Object(form));
        }
        if content_type.contains("json") {
            if let Ok(value) = serde_json::from_slice(body) {
                return RawPayload::Json(value);
            }
        }

        match std::str::from_utf8(body) {
            Ok(text) if content_type.starts_with("text/") || content_type.contains("json") => {
                RawPayload::Text(text.to_string())
            }
            _ => RawPayload::Bytes(body.to_vec()),
        }
    }
}

/// Decode a request body into a JSON value, or `None` if no interpretation works.
pub fn normalize(cipher: &SymmetricCipher, raw: RawPayload) -> Option<Value> {
    match raw {
        RawPayload::Absent => None,
        RawPayload::Json(value) => normalize_value(cipher, value),
        RawPayload::Text(text) => normalize_text(cipher, text),
        RawPayload::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => normalize_text(cipher, text),
            Err(_) => None,
        },
    }
}

fn normalize_text(cipher: &SymmetricCipher, text: String) -> Option<Value> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => normalize_value(cipher, value),
        Err(_) => decode_text(cipher, &text),
    }
}

fn normalize_value(cipher: &SymmetricCipher, value: Value) -> Option<Value> {
    match value {
        Value::String(text) => decode_text(cipher, &text),
        Value::Object(map) => {
            let inner = match map.get(DATA_FIELD) {
                Some(Value::String(text)) if !text.is_empty() => return decode_text(cipher, text),
                Some(inner @ (Value::Object(_) | Value::Array(_))) => Some(inner.clone()),
                _ => None,
            };
            Some(inner.unwrap_or(Value::Object(map)))
        }
        array @ Value::Array(_) => Some(array),
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    }
}

/// Decrypt, then fall back to base64, parsing JSON where possible.
fn decode_text(cipher: &SymmetricCipher, text: &str) -> Option<Value> {
    // An unescaped `+` in a form body arrives as a space; base64 never has spaces.
    let text = text.trim().replace(' ', "+");
    if text.is_empty() {
        return None;
    }
    let text = text.as_str();

    match cipher.decrypt(text) {
        Ok(plaintext) => return Some(parse_or_string(plaintext)),
        Err(e) => debug!(error = %e, "payload is not ciphertext, trying base64"),
    }

    let decoded = STANDARD.decode(text).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    Some(parse_or_string(decoded))
}

fn parse_or_string(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
