// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contact form submissions.

use axum::{extract::State, Json};
use chrono::SecondsFormat;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use super::envelope::Payload;
use crate::error::ApiError;
use crate::models::ContactSubmission;
use crate::providers::MailRequest;
use crate::state::AppState;
use crate::store::RECEIVE_MAIL_ON_CONTACT_US;

const CONTACT_TEMPLATE: &str = "contact_us";
const CONTACT_SUBJECT: &str = "New Contact Us Submission";
const CREATED_FIELD: &str = "created_date";

/// Template placeholder and the submission field that fills it.
const MAIL_FIELDS: &[(&str, &str)] = &[
    ("NAME", "full_name"),
    ("EMAIL", "email"),
    ("PHONE", "phone"),
    ("MESSAGE", "note"),
];

/// Store a contact submission and notify the contact-form recipients.
///
/// Data-service failures are reported as `200 {"error": ...}`. Mail failures
/// after a successful insert are only logged.
#[utoipa::path(
    post,
    path = "/api/contact-us",
    tag = "Notifications",
    request_body = ContactSubmission,
    responses(
        (status = 200, description = "Stored row(s), or `{error}` when the data service failed"),
        (status = 400, description = "Invalid payload: expected JSON object"),
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Payload(payload): Payload,
) -> Result<Json<Value>, ApiError> {
    let mut submission = as_object(payload)
        .ok_or_else(|| ApiError::bad_request("Invalid payload: expected JSON object"))?;
    submission.insert(
        CREATED_FIELD.to_string(),
        Value::String(chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    let context = mail_context(&submission);

    let stored = match state.data_api.insert_contact(&Value::Object(submission)).await {
        Ok(stored) => stored,
        Err(e) => {
            error!(error = %e, "Contact submission failed");
            return Ok(Json(json!({ "error": e.to_string() })));
        }
    };

    if let Err(e) = notify_recipients(&state, context).await {
        warn!(error = %e.message, "Contact submission stored but notification failed");
    }

    Ok(Json(stored))
}

/// Accept an object, or a string holding one.
fn as_object(payload: Option<Value>) -> Option<Map<String, Value>> {
    match payload? {
        Value::Object(map) => Some(map),
        Value::String(text) => match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Mail placeholders from the submission. Scalars render as text, missing
/// or null fields as empty.
fn mail_context(submission: &Map<String, Value>) -> tera::Context {
    let mut context = tera::Context::new();
    for (placeholder, field) in MAIL_FIELDS {
        let text = match submission.get(*field) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        context.insert(*placeholder, &text);
    }
    context
}

async fn notify_recipients(state: &AppState, context: tera::Context) -> Result<(), ApiError> {
    let emails = state
        .store
        .recipients_with_authorization(RECEIVE_MAIL_ON_CONTACT_US)
        .await?;
    if emails.is_empty() {
        info!("No contact-form recipients configured");
        return Ok(());
    }

    let recipients = emails.len();
    let mail = state.templates.render(MailRequest {
        to: emails,
        subject: Some(CONTACT_SUBJECT.to_string()),
        template: Some(CONTACT_TEMPLATE.to_string()),
        context,
        ..Default::default()
    });
    state.mailer.send(mail).await?;

    info!(recipients, "Contact notification sent");
    Ok(())
}
