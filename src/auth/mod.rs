// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Self-issued HS256 bearer tokens for the content API.
//!
//! ## Auth Flow
//!
//! 1. Client posts `{username, password}` to `/token`
//! 2. Server checks the credentials against the user store and returns a
//!    token valid for 7 days
//! 3. Client sends `Authorization: Bearer <token>` on later requests
//! 4. The authorization gate verifies the token on every request and
//!    resolves the subject as the request identity
//! 5. Before expiry the client may call `/refresh` for a new token
//!
//! ## Security
//!
//! - Signatures are HMAC-SHA256 and compared in constant time
//! - The signing key is required at startup; there is no fallback secret
//! - Tokens are not stored server-side and cannot be revoked before expiry

pub mod claims;
pub mod codec;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod roles;
pub mod service;

pub use claims::{AuthenticatedIdentity, TokenPayload};
pub use codec::{SigningKey, TokenCodec};
pub use error::AuthError;
pub use extractor::{Auth, BearerExtractor, OptionalAuth};
pub use middleware::{authorization_gate, permission_check, RequestAuth};
pub use roles::Role;
pub use service::AuthService;
