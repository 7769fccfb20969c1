// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact HS256 token encoding and verification.
//!
//! ## Wire format
//!
//! `base64url(header) "." base64url(payload) "." base64url(signature)`, no
//! padding, where the signature is HMAC-SHA256 over the exact bytes of
//! `encodedHeader.encodedPayload`.
//!
//! ## Verification order
//!
//! 1. Segment count (cheap, no crypto)
//! 2. Signature, compared in constant time
//! 3. Payload JSON
//! 4. Expiry
//!
//! The header is covered by the signature but its contents are not
//! interpreted.

use std::fmt;

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::claims::{TokenHeader, TokenPayload};
use super::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Token codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("token could not be serialized: {0}")]
    EncodingFailed(String),
    #[error("token must have exactly three segments")]
    InvalidTokenFormat,
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("token payload is not valid")]
    InvalidPayload,
    #[error("token expired")]
    TokenExpired,
}

impl From<CodecError> for AuthError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::EncodingFailed(_) => AuthError::TokenGenerationFailed,
            CodecError::InvalidTokenFormat => AuthError::InvalidTokenFormat,
            CodecError::InvalidSignature => AuthError::InvalidSignature,
            CodecError::InvalidPayload => AuthError::InvalidPayload,
            CodecError::TokenExpired => AuthError::TokenExpired,
        }
    }
}

/// Secret used to sign and verify tokens.
///
/// Loaded once at startup and never mutated. An empty key is refused.
#[derive(Clone)]
pub struct SigningKey {
    mac: HmacSha256,
}

impl SigningKey {
    /// Returns `None` for an empty secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Option<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return None;
        }
        let mac = <HmacSha256 as Mac>::new_from_slice(secret).ok()?;
        Some(Self { mac })
    }

    fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey([REDACTED])")
    }
}

/// Pure encoder/decoder for signed tokens.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: SigningKey,
}

impl TokenCodec {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Serialize, sign and join a token for `payload`.
    pub fn encode(&self, payload: &TokenPayload) -> Result<String, CodecError> {
        let header = serde_json::to_vec(&TokenHeader::default())
            .map_err(|e| CodecError::EncodingFailed(e.to_string()))?;
        let payload = serde_json::to_vec(payload)
            .map_err(|e| CodecError::EncodingFailed(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            Base64UrlUnpadded::encode_string(&header),
            Base64UrlUnpadded::encode_string(&payload)
        );

        let mut mac = self.key.mac();
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        ))
    }

    /// Verify `token` and return its payload if it is still valid at `now`.
    pub fn decode(&self, token: &str, now: i64) -> Result<TokenPayload, CodecError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(CodecError::InvalidTokenFormat);
        };

        let signature =
            Base64UrlUnpadded::decode_vec(signature).map_err(|_| CodecError::InvalidSignature)?;
        let signing_input = &token[..header.len() + 1 + payload.len()];

        let mut mac = self.key.mac();
        mac.update(signing_input.as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&signature)
            .map_err(|_| CodecError::InvalidSignature)?;

        let payload_json =
            Base64UrlUnpadded::decode_vec(payload).map_err(|_| CodecError::InvalidPayload)?;
        let claims: TokenPayload =
            serde_json::from_slice(&payload_json).map_err(|_| CodecError::InvalidPayload)?;

        if claims.exp <= now {
            return Err(CodecError::TokenExpired);
        }

        Ok(claims)
    }
}
