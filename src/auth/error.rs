// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

/// Authentication error type.
///
/// Every failure of token issuance, verification or refresh surfaces as one
/// of these variants. None of them are retried internally; callers may retry
/// `UpstreamUnavailable` on their own schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Username/password rejected by the user store
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Login request without a username or password
    #[error("Username and password are required")]
    MissingCredentials,
    /// No token in any header or parameter
    #[error("No token provided")]
    NoToken,
    /// Token does not have exactly three segments
    #[error("Invalid token format")]
    InvalidTokenFormat,
    /// Token signature does not match
    #[error("Invalid token signature")]
    InvalidSignature,
    /// Token payload is not valid base64url JSON with the expected claims
    #[error("Invalid token payload")]
    InvalidPayload,
    /// Token expiry has passed
    #[error("Token has expired")]
    TokenExpired,
    /// Protected operation without a resolved identity
    #[error("Authentication required")]
    Unauthenticated,
    /// Token could not be encoded
    #[error("Could not generate token")]
    TokenGenerationFailed,
    /// User store failed or did not answer in time. The detail is logged,
    /// never sent to the client.
    #[error("User store unavailable")]
    UpstreamUnavailable(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    message: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::NoToken => "no_token",
            AuthError::InvalidTokenFormat
            | AuthError::InvalidSignature
            | AuthError::InvalidPayload
            | AuthError::Unauthenticated => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenGenerationFailed => "token_generation_failed",
            AuthError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials | AuthError::NoToken => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::InvalidTokenFormat
            | AuthError::InvalidSignature
            | AuthError::InvalidPayload
            | AuthError::TokenExpired
            | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::TokenGenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::UpstreamUnavailable(_))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::UpstreamUnavailable(detail) = &self {
            warn!(detail = %detail, "User store unavailable");
        }
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.error_code().to_string(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn invalid_credentials_returns_401() {
        let response = AuthError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "invalid_credentials");
        assert_eq!(body["message"], "Invalid username or password");
    }

    #[tokio::test]
    async fn no_token_returns_400() {
        let response = AuthError::NoToken.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn decode_failures_share_invalid_token_code() {
        for err in [
            AuthError::InvalidTokenFormat,
            AuthError::InvalidSignature,
            AuthError::InvalidPayload,
            AuthError::Unauthenticated,
        ] {
            assert_eq!(err.error_code(), "invalid_token");
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(AuthError::TokenExpired.error_code(), "token_expired");
    }

    #[test]
    fn only_upstream_failures_are_retryable() {
        assert!(AuthError::UpstreamUnavailable("timeout".into()).is_retryable());
        assert_eq!(
            AuthError::UpstreamUnavailable("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert!(!AuthError::TokenExpired.is_retryable());
        assert!(!AuthError::InvalidCredentials.is_retryable());
    }

    #[tokio::test]
    async fn upstream_detail_is_not_sent_to_client() {
        let response = AuthError::UpstreamUnavailable("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "upstream_unavailable");
        assert_eq!(body["message"], "User store unavailable");
    }

    #[test]
    fn generation_failure_is_server_error() {
        assert_eq!(
            AuthError::TokenGenerationFailed.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
