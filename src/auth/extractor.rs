// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer credential extraction and Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is AuthenticatedIdentity
//! }
//! ```
//!
//! ## Token sources
//!
//! 1. `Authorization: Bearer <token>`
//! 2. The alternate header some proxies rewrite `Authorization` into
//!    (`x-forwarded-authorization` unless configured otherwise)
//! 3. An explicit `token` parameter, only where the handler passes one

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderName},
};

use super::middleware::{resolve_request_auth, RequestAuth};
use super::{AuthError, AuthenticatedIdentity};
use crate::state::AppState;

/// Default alternate header consulted after `Authorization`.
pub const DEFAULT_FALLBACK_HEADER: &str = "x-forwarded-authorization";

const BEARER_PREFIX: &str = "Bearer ";

/// Pulls a bearer token out of request headers.
#[derive(Debug, Clone)]
pub struct BearerExtractor {
    fallback_header: HeaderName,
}

impl Default for BearerExtractor {
    fn default() -> Self {
        Self {
            fallback_header: HeaderName::from_static(DEFAULT_FALLBACK_HEADER),
        }
    }
}

impl BearerExtractor {
    pub fn new(fallback_header: HeaderName) -> Self {
        Self { fallback_header }
    }

    pub fn fallback_header(&self) -> &HeaderName {
        &self.fallback_header
    }

    /// Find a bearer token in `headers`, then in `fallback_param`.
    ///
    /// Header values must start with the case-sensitive prefix `Bearer `;
    /// the token is the first whitespace-delimited word after it.
    /// `fallback_param` is taken verbatim.
    pub fn extract(&self, headers: &HeaderMap, fallback_param: Option<&str>) -> Option<String> {
        [&AUTHORIZATION, &self.fallback_header]
            .into_iter()
            .find_map(|name| bearer_from_header(headers, name))
            .or_else(|| {
                fallback_param
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(str::to_string)
            })
    }
}

fn bearer_from_header(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.split_whitespace().next()?;
    Some(token.to_string())
}

/// Extractor for routes that require authentication.
///
/// Rejects with the decode error recorded by the authorization gate, or
/// with `Unauthenticated` when the request carried no token.
pub struct Auth(pub AuthenticatedIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match request_auth(parts, state) {
            RequestAuth::Authenticated(identity) => Ok(Auth(identity)),
            RequestAuth::Rejected(err) => Err(err),
            RequestAuth::Anonymous => Err(AuthError::Unauthenticated),
        }
    }
}

/// Optional authentication extractor.
///
/// Returns `None` if no valid authentication is present, instead of rejecting.
pub struct OptionalAuth(pub Option<AuthenticatedIdentity>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match request_auth(parts, state) {
            RequestAuth::Authenticated(identity) => Ok(OptionalAuth(Some(identity))),
            RequestAuth::Rejected(_) | RequestAuth::Anonymous => Ok(OptionalAuth(None)),
        }
    }
}

/// Outcome recorded by the gate, or resolved here if the gate did not run.
fn request_auth(parts: &Parts, state: &AppState) -> RequestAuth {
    if let Some(outcome) = parts.extensions.get::<RequestAuth>() {
        return outcome.clone();
    }
    resolve_request_auth(&parts.headers, state)
}
