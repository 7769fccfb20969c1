// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth::authorization_gate, error::ApiError, state::AppState};

pub mod health;
pub mod token;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the route table.
///
/// Every route sits behind the authorization gate; only `/refresh` and `/me`
/// require the gate to have resolved an identity.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let api_routes = Router::new()
        .route("/token", post(token::issue_token))
        .route("/validate", post(token::validate_token))
        .route("/refresh", post(token::refresh_token))
        .route("/me", get(users::get_current_user))
        .route("/health", get(health::liveness))
        .fallback(|| async { ApiError::no_route() })
        .layer(from_fn_with_state(state.clone(), authorization_gate))
        .with_state(state);

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

/// CORS policy.
///
/// `Authorization` is only an allowed request header when `allow_auth_header`
/// is set, so browsers can send bearer tokens cross-origin only by opt-in.
pub fn cors_layer(allow_auth_header: bool, allowed_origins: &[String]) -> CorsLayer {
    let mut allowed_headers = vec![
        header::CONTENT_TYPE,
        HeaderName::from_static("x-requested-with"),
    ];
    if allow_auth_header {
        allowed_headers.push(header::AUTHORIZATION);
    }

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allowed_headers);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        token::issue_token,
        token::validate_token,
        token::refresh_token,
        users::get_current_user,
        health::liveness
    ),
    components(
        schemas(
            token::TokenRequest,
            token::TokenResponse,
            token::TokenParam,
            token::ValidateResponse,
            token::RefreshResponse,
            users::UserInfoResponse,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Token issuance, validation and refresh"),
        (name = "Users", description = "Authenticated user information"),
        (name = "Health", description = "Liveness probe")
    )
)]
struct ApiDoc;

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
