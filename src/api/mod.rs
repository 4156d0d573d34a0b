// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthenticatedUser, Scope},
    models::{
        Authorization, ContactSubmission, DocumentsRequest, LoginRequest, LoginResponse,
        MailDispatchResponse, NavHistoryFilter, NavUpdateRequest, RouteInfo, RouteList,
        UserSummary,
    },
    state::AppState,
};

pub mod auth;
pub mod catalog;
pub mod contact;
pub mod envelope;
pub mod health;
pub mod meta;
pub mod notifications;
pub mod users;

/// Every route served under `/api`, as reported by `/api/routes`.
pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/api/token"),
    ("POST", "/api/login"),
    ("GET", "/api/schemes"),
    ("POST", "/api/nav-history"),
    ("POST", "/api/documents"),
    ("GET", "/api/document-categories"),
    ("POST", "/api/send-mail-nav-update"),
    ("POST", "/api/contact-us"),
    ("GET", "/api/routes"),
    ("GET", "/api/users/me"),
];

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/token", get(auth::issue_public_token))
        .route("/login", post(auth::login))
        .route("/schemes", get(catalog::list_schemes))
        .route("/nav-history", post(catalog::nav_history))
        .route("/documents", post(catalog::list_documents))
        .route("/document-categories", get(catalog::list_document_categories))
        .route("/send-mail-nav-update", post(notifications::send_nav_update))
        .route("/contact-us", post(contact::submit_contact))
        .route("/routes", get(meta::list_routes))
        .route("/users/me", get(users::get_current_user))
        .fallback(meta::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            envelope::encrypt_responses,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/api", api_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        auth::issue_public_token,
        auth::login,
        catalog::list_schemes,
        catalog::nav_history,
        catalog::list_documents,
        catalog::list_document_categories,
        notifications::send_nav_update,
        contact::submit_contact,
        meta::list_routes,
        users::get_current_user
    ),
    components(
        schemas(
            Authorization,
            AuthenticatedUser,
            Scope,
            LoginRequest,
            LoginResponse,
            UserSummary,
            NavHistoryFilter,
            DocumentsRequest,
            NavUpdateRequest,
            MailDispatchResponse,
            ContactSubmission,
            RouteInfo,
            RouteList,
            health::ReadyResponse,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and dependency checks"),
        (name = "Auth", description = "Public tokens and login"),
        (name = "Catalog", description = "Schemes, NAV history and documents"),
        (name = "Notifications", description = "NAV update mail and contact form"),
        (name = "Meta", description = "Route listing"),
        (name = "Users", description = "Token principal")
    ),
    info(
        title = "TPF Gateway",
        description = "Every `/api` response body is a JSON string holding AES-128-CBC ciphertext unless plain mode is requested."
    )
)]
pub struct ApiDoc;
