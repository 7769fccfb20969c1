// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate for Axum.
//!
//! The gate runs ahead of every handler. It extracts a bearer token, decodes
//! it, and records the outcome in the request extensions as [`RequestAuth`]:
//!
//! - no token: `Anonymous`, the request proceeds
//! - token verifies: `Authenticated(identity)`
//! - token fails: `Rejected(error)`, the request still proceeds
//!
//! Handlers decide what a rejection means. `Auth` fails the request with the
//! recorded error; `OptionalAuth` ignores it. Each request starts anonymous
//! and nothing carries over between requests.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         authorization_gate,
//!     ));
//! ```

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::{AuthError, AuthenticatedIdentity};
use crate::state::AppState;

/// Per-request authentication outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuth {
    /// No credential presented
    Anonymous,
    /// Bearer token verified
    Authenticated(AuthenticatedIdentity),
    /// Bearer token presented but rejected
    Rejected(AuthError),
}

impl RequestAuth {
    pub fn identity(&self) -> Option<&AuthenticatedIdentity> {
        match self {
            RequestAuth::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Resolve the authentication outcome for a set of request headers.
pub fn resolve_request_auth(headers: &HeaderMap, state: &AppState) -> RequestAuth {
    let Some(token) = state.bearer.extract(headers, None) else {
        return RequestAuth::Anonymous;
    };

    match state.auth.codec().decode(&token, state.clock.now()) {
        Ok(payload) => RequestAuth::Authenticated(AuthenticatedIdentity::from_payload(&payload)),
        Err(err) => {
            let err = AuthError::from(err);
            debug!(error_code = err.error_code(), reason = %err, "Bearer token rejected");
            RequestAuth::Rejected(err)
        }
    }
}

/// Authorization gate middleware function.
pub async fn authorization_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = resolve_request_auth(request.headers(), &state);
    if let Some(identity) = outcome.identity() {
        debug!(user_id = identity.user_id, "Request authenticated");
    }
    request.extensions_mut().insert(outcome);
    next.run(request).await
}

/// Whether a protected operation may proceed for `identity`.
pub fn permission_check(identity: Option<&AuthenticatedIdentity>) -> bool {
    identity.is_some_and(|identity| identity.user_id > 0)
}
