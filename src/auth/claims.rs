// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and authenticated identity representation.

use serde::{Deserialize, Serialize};

use crate::store::User;

/// Fixed token header. Field order is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub typ: String,
    pub alg: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            typ: "JWT".to_string(),
            alg: "HS256".to_string(),
        }
    }
}

/// Claims carried by every issued token.
///
/// Serialized as
/// `{"iss":..,"iat":..,"exp":..,"data":{"user":{"id":..,"username":..,"email":..,"roles":[..]}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Issuer (base URL of the service)
    pub iss: String,
    /// Issued at timestamp (unix seconds)
    pub iat: i64,
    /// Expiration timestamp (unix seconds)
    pub exp: i64,
    /// Subject claims
    pub data: SubjectData,
}

/// Wrapper object around the subject, kept for wire compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectData {
    pub user: SubjectClaims,
}

/// The user a token asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectClaims {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl From<&User> for SubjectClaims {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
        }
    }
}

impl TokenPayload {
    /// Build the claims for `subject`, valid from `issued_at` for `validity_secs`.
    pub fn new(
        issuer: impl Into<String>,
        issued_at: i64,
        validity_secs: i64,
        subject: SubjectClaims,
    ) -> Self {
        Self {
            iss: issuer.into(),
            iat: issued_at,
            exp: issued_at.saturating_add(validity_secs),
            data: SubjectData { user: subject },
        }
    }

    pub fn subject(&self) -> &SubjectClaims {
        &self.data.user
    }
}

/// Identity resolved for the lifetime of one request.
///
/// Derived only from a successfully decoded token and never written back to
/// the user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Subject user id
    pub user_id: u64,
    /// Login name as asserted by the token
    pub username: String,
    /// Roles as asserted by the token (may be stale)
    pub roles: Vec<String>,
    /// Token expiration (unix seconds)
    pub expires_at: i64,
}

impl AuthenticatedIdentity {
    /// Create from decoded token claims.
    pub fn from_payload(payload: &TokenPayload) -> Self {
        let subject = payload.subject();
        Self {
            user_id: subject.id,
            username: subject.username.clone(),
            roles: subject.roles.clone(),
            expires_at: payload.exp,
        }
    }
}
