// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{permission_check, Auth, AuthError};
use crate::state::AppState;
use crate::store::User;

/// Response for GET /me
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfoResponse {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<String>,
    pub capabilities: Vec<String>,
}

impl From<User> for UserInfoResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            roles: user.roles,
            capabilities: user.capabilities,
        }
    }
}

/// Get the current authenticated user's information.
///
/// The record is read from the user store, so roles and capabilities are
/// current even if the token was issued before they changed.
#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserInfoResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Json<UserInfoResponse>, AuthError> {
    if !permission_check(Some(&identity)) {
        return Err(AuthError::Unauthenticated);
    }
    let user = state.auth.current_user(Some(&identity)).await?;
    Ok(Json(user.into()))
}
