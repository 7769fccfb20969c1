// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token Auth Server - stateless bearer-token authentication
//!
//! Exchanges user credentials for HS256-signed tokens and authenticates later
//! requests from those tokens alone. Tokens carry the user's id, login, e-mail
//! and roles; the user store is only consulted at login, on refresh and for
//! `/me`.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, credential extraction, authorization gate
//! - `clock` - Injectable time source
//! - `config` - Environment configuration
//! - `store` - User store trait and in-memory implementation

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
