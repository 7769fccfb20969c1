// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance, refresh and validation.
//!
//! `AuthService` is built once at startup with the signing key and the user
//! store, then shared read-only by every request through `AppState`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::claims::{AuthenticatedIdentity, SubjectClaims, TokenPayload};
use super::codec::TokenCodec;
use super::error::AuthError;
use crate::store::{User, UserStore, UserStoreError};

/// Default token validity (7 days).
pub const DEFAULT_TOKEN_VALIDITY_SECS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on the token validity window (10 years).
pub const MAX_TOKEN_VALIDITY_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Default deadline for a single user store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires: i64,
    pub subject: SubjectClaims,
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenValidation {
    pub valid: bool,
    pub user_id: u64,
    pub expires: i64,
}

pub struct AuthService {
    codec: TokenCodec,
    users: Arc<dyn UserStore>,
    issuer: String,
    validity_secs: i64,
    store_timeout: Duration,
}

impl AuthService {
    pub fn new(codec: TokenCodec, users: Arc<dyn UserStore>, issuer: impl Into<String>) -> Self {
        Self {
            codec,
            users,
            issuer: issuer.into(),
            validity_secs: DEFAULT_TOKEN_VALIDITY_SECS,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Set the token validity window, clamped to `1..=MAX_TOKEN_VALIDITY_SECS`.
    pub fn with_validity_secs(mut self, secs: i64) -> Self {
        self.validity_secs = secs.clamp(1, MAX_TOKEN_VALIDITY_SECS);
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Check credentials against the user store and issue a token.
    pub async fn issue_token(
        &self,
        username: &str,
        password: &str,
        now: i64,
    ) -> Result<IssuedToken, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user = self
            .call_store("authenticate", self.users.authenticate(username, password))
            .await
            .map_err(|e| match e {
                UserStoreError::Unavailable(msg) => AuthError::UpstreamUnavailable(msg),
                _ => AuthError::InvalidCredentials,
            });

        let user = match user {
            Ok(user) => user,
            Err(err) => {
                info!(error_code = err.error_code(), "Login rejected");
                return Err(err);
            }
        };

        let issued = self.sign_for(&user, now)?;
        info!(user_id = user.id, expires = issued.expires, "Token issued");
        Ok(issued)
    }

    /// Issue a new token for an already authenticated request.
    ///
    /// The user is re-read so role changes since the previous token apply.
    pub async fn refresh_token(
        &self,
        identity: Option<&AuthenticatedIdentity>,
        now: i64,
    ) -> Result<IssuedToken, AuthError> {
        let user = self.load_current_user(identity).await?;
        let issued = self.sign_for(&user, now)?;
        info!(user_id = user.id, expires = issued.expires, "Token refreshed");
        Ok(issued)
    }

    /// Verify a token presented to the validation endpoint.
    pub fn validate_token(
        &self,
        token: Option<&str>,
        now: i64,
    ) -> Result<TokenValidation, AuthError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::NoToken)?;
        let payload = self.codec.decode(token, now).map_err(AuthError::from)?;
        Ok(TokenValidation {
            valid: true,
            user_id: payload.subject().id,
            expires: payload.exp,
        })
    }

    /// Full record of the authenticated user.
    pub async fn current_user(
        &self,
        identity: Option<&AuthenticatedIdentity>,
    ) -> Result<User, AuthError> {
        self.load_current_user(identity).await
    }

    async fn load_current_user(
        &self,
        identity: Option<&AuthenticatedIdentity>,
    ) -> Result<User, AuthError> {
        let identity = identity
            .filter(|identity| identity.user_id > 0)
            .ok_or(AuthError::Unauthenticated)?;

        self.call_store("get_by_id", self.users.get_by_id(identity.user_id))
            .await
            .map_err(|e| match e {
                UserStoreError::Unavailable(msg) => AuthError::UpstreamUnavailable(msg),
                _ => {
                    debug!(user_id = identity.user_id, "Token subject no longer exists");
                    AuthError::Unauthenticated
                }
            })
    }

    fn sign_for(&self, user: &User, now: i64) -> Result<IssuedToken, AuthError> {
        if now.checked_add(self.validity_secs).is_none() {
            warn!(user_id = user.id, now, "Token expiry out of range");
            return Err(AuthError::TokenGenerationFailed);
        }
        let payload = TokenPayload::new(
            self.issuer.clone(),
            now,
            self.validity_secs,
            SubjectClaims::from(user),
        );
        let token = self.codec.encode(&payload).map_err(|e| {
            warn!(user_id = user.id, error = %e, "Token encoding failed");
            AuthError::from(e)
        })?;
        Ok(IssuedToken {
            token,
            expires: payload.exp,
            subject: payload.data.user,
        })
    }

    async fn call_store<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, UserStoreError>>,
    ) -> Result<T, UserStoreError> {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "User store call timed out"
                );
                Err(UserStoreError::Unavailable(format!("{operation} timed out")))
            }
        }
    }
}
