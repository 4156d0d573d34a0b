// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! NAV update notification mail.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{info, warn};

use super::envelope::Payload;
use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::{MailDispatchResponse, NavUpdateRequest, SchemeRecord};
use crate::providers::MailRequest;
use crate::state::AppState;
use crate::store::UPDATE_SCHEMES_STATUS;

const NAV_TEMPLATE: &str = "nav";
const NAV_SUBJECT: &str = "NAV Update";

/// Mail the latest NAV of the given schemes to everyone subscribed to NAV updates.
#[utoipa::path(
    post,
    path = "/api/send-mail-nav-update",
    tag = "Notifications",
    security(("bearer" = [])),
    request_body = NavUpdateRequest,
    responses(
        (status = 200, description = "Mail dispatched", body = MailDispatchResponse),
        (status = 401, description = "Unauthorized: invalid or missing token"),
        (status = 404, description = "No schemes found for the given IDs"),
        (status = 500, description = "Directory or mail failure"),
    )
)]
pub async fn send_nav_update(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Payload(payload): Payload,
) -> Result<Json<MailDispatchResponse>, ApiError> {
    let ids = payload
        .and_then(|value| serde_json::from_value::<NavUpdateRequest>(value).ok())
        .map(|request| request.id)
        .unwrap_or_default();

    let schemes = if ids.is_empty() {
        Vec::new()
    } else {
        state.store.schemes_by_ids(&ids).await?
    };
    if schemes.is_empty() {
        return Err(ApiError::not_found("No schemes found for the given IDs"));
    }

    let emails = state
        .store
        .recipients_with_authorization(UPDATE_SCHEMES_STATUS)
        .await?;
    if emails.is_empty() {
        warn!(schemes = schemes.len(), "No recipients for NAV update");
        return Ok(Json(MailDispatchResponse {
            success: false,
            message: "No users subscribed to NAV updates".to_string(),
            emails,
        }));
    }

    let mut context = tera::Context::new();
    context.insert("rows", &nav_rows(&schemes));
    context.insert("DATE", &chrono::Local::now().format("%-m/%-d/%Y").to_string());

    let mail = state.templates.render(MailRequest {
        to: emails.clone(),
        subject: Some(NAV_SUBJECT.to_string()),
        template: Some(NAV_TEMPLATE.to_string()),
        context,
        ..Default::default()
    });
    state.mailer.send(mail).await?;

    info!(
        user_id = ?caller.user_id,
        schemes = schemes.len(),
        recipients = emails.len(),
        "NAV update mail sent"
    );

    Ok(Json(MailDispatchResponse {
        success: true,
        message: "Email sent to users".to_string(),
        emails,
    }))
}

/// One table row of the NAV mail.
#[derive(Debug, Serialize, PartialEq, Eq)]
struct NavRow<'a> {
    id: i32,
    scheme_name: &'a str,
    nav: &'a str,
    nav_date: &'a str,
}

fn nav_rows(schemes: &[SchemeRecord]) -> Vec<NavRow<'_>> {
    schemes
        .iter()
        .map(|scheme| NavRow {
            id: scheme.id,
            scheme_name: &scheme.scheme_name,
            nav: scheme.modified_nav.as_deref().unwrap_or_default(),
            nav_date: scheme.modified_nav_date.as_deref().unwrap_or_default(),
        })
        .collect()
}
