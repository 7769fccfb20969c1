// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token endpoints: issue, validate and refresh.

use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{permission_check, Auth, AuthError},
    state::AppState,
};

/// Login request body, sent as JSON or as a urlencoded form.
#[derive(Debug, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct TokenRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response for POST /token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub user_id: u64,
    pub user_login: String,
    pub user_email: String,
    pub user_roles: Vec<String>,
    /// Expiry (unix seconds)
    pub expires: i64,
}

/// Explicit token parameter accepted by POST /validate
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct TokenParam {
    pub token: Option<String>,
}

/// Response for POST /validate
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub valid: bool,
    pub user_id: u64,
    pub expires: i64,
}

/// Response for POST /refresh
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub token: String,
    pub expires: i64,
}

/// Exchange a username and password for a token.
#[utoipa::path(
    post,
    path = "/token",
    tag = "Auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid username or password"),
        (status = 502, description = "User store unavailable"),
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TokenResponse>, AuthError> {
    let request = parse_login(&headers, &body)?;
    let issued = state
        .auth
        .issue_token(&request.username, &request.password, state.clock.now())
        .await?;

    Ok(Json(TokenResponse {
        token: issued.token,
        user_id: issued.subject.id,
        user_login: issued.subject.username,
        user_email: issued.subject.email,
        user_roles: issued.subject.roles,
        expires: issued.expires,
    }))
}

/// Check a token from the `Authorization` header or a `token` parameter.
#[utoipa::path(
    post,
    path = "/validate",
    tag = "Auth",
    params(TokenParam),
    request_body(content = TokenParam, description = "Optional `{token}` body"),
    responses(
        (status = 200, description = "Token is valid", body = ValidateResponse),
        (status = 400, description = "No token provided"),
        (status = 401, description = "Token invalid or expired"),
    )
)]
pub async fn validate_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Json<ValidateResponse>, AuthError> {
    let param = token_from_body(&body)
        .or_else(|| query.and_then(|query| form_field(query.as_bytes(), "token")));
    let token = state.bearer.extract(&headers, param.as_deref());

    let validation = state
        .auth
        .validate_token(token.as_deref(), state.clock.now())?;

    Ok(Json(ValidateResponse {
        valid: validation.valid,
        user_id: validation.user_id,
        expires: validation.expires,
    }))
}

/// Read login fields from a JSON or urlencoded body.
///
/// A body without a content type is tried as JSON first, then as a form.
/// Anything unreadable is reported as missing credentials.
fn parse_login(headers: &HeaderMap, body: &[u8]) -> Result<TokenRequest, AuthError> {
    if body.is_empty() {
        return Ok(TokenRequest::default());
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase());

    match content_type.as_deref() {
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => Ok(login_form(body)),
        Some(ct) if ct.starts_with("application/json") => {
            serde_json::from_slice(body).map_err(|_| AuthError::MissingCredentials)
        }
        None => Ok(serde_json::from_slice(body).unwrap_or_else(|_| login_form(body))),
        Some(_) => Err(AuthError::MissingCredentials),
    }
}

fn login_form(body: &[u8]) -> TokenRequest {
    TokenRequest {
        username: form_field(body, "username").unwrap_or_default(),
        password: form_field(body, "password").unwrap_or_default(),
    }
}

fn form_field(input: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn token_from_body(body: &Bytes) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice::<TokenParam>(body) {
        Ok(param) => param.token,
        Err(_) => form_field(body, "token"),
    }
}

/// Issue a fresh token for the authenticated user.
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Token refreshed", body = RefreshResponse),
        (status = 401, description = "Missing, invalid or expired token"),
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Json<RefreshResponse>, AuthError> {
    if !permission_check(Some(&identity)) {
        return Err(AuthError::Unauthenticated);
    }

    let issued = state
        .auth
        .refresh_token(Some(&identity), state.clock.now())
        .await?;

    Ok(Json(RefreshResponse {
        token: issued.token,
        expires: issued.expires,
    }))
}
