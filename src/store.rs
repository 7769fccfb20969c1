// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User store consumed by the authentication service.
//!
//! The service only ever reads users: it checks credentials at login and
//! re-reads the current record on refresh and `/me`. `InMemoryUserStore` is
//! the bundled implementation used by the binary; accounts are seeded at
//! startup and passwords are kept as bcrypt hashes.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::roles::capabilities_for;

/// A user account as seen by the authentication subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub roles: Vec<String>,
    pub capabilities: Vec<String>,
}

/// User store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    /// Unknown login or wrong password. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user {0} not found")]
    NotFound(u64),
    #[error("user {0} already exists")]
    Conflict(String),
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Check a login name (or e-mail address) and password.
    async fn authenticate(&self, login: &str, password: &str) -> Result<User, UserStoreError>;

    /// Fetch the current record for `id`.
    async fn get_by_id(&self, id: u64) -> Result<User, UserStoreError>;
}

/// Account to create in the in-memory store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub password: String,
    pub roles: Vec<String>,
}

struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Accounts {
    by_id: HashMap<u64, StoredUser>,
    next_id: u64,
}

/// Password checked for logins that match no account, so unknown and known
/// logins both pay for one bcrypt verification.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-logins";

/// In-memory user store with bcrypt password hashes.
pub struct InMemoryUserStore {
    accounts: RwLock<Accounts>,
    hash_cost: u32,
    decoy_hash: String,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::with_hash_cost(bcrypt::DEFAULT_COST)
    }

    /// Store hashing passwords with the given bcrypt work factor.
    pub fn with_hash_cost(cost: u32) -> Self {
        Self {
            accounts: RwLock::new(Accounts::default()),
            hash_cost: cost,
            decoy_hash: decoy_hash(cost),
        }
    }

    /// Create an account. Ids are assigned sequentially from 1.
    pub async fn insert_user(&self, new_user: NewUser) -> Result<User, UserStoreError> {
        let password_hash = bcrypt::hash(&new_user.password, self.hash_cost)
            .map_err(|e| UserStoreError::Unavailable(e.to_string()))?;

        let mut accounts = self.accounts.write().await;
        let taken = accounts.by_id.values().any(|stored| {
            stored.user.username == new_user.username
                || stored.user.email.eq_ignore_ascii_case(&new_user.email)
        });
        if taken {
            return Err(UserStoreError::Conflict(new_user.username));
        }

        accounts.next_id += 1;
        let id = accounts.next_id;
        let user = User {
            id,
            display_name: new_user
                .display_name
                .unwrap_or_else(|| new_user.username.clone()),
            capabilities: capabilities_for(&new_user.roles),
            username: new_user.username,
            email: new_user.email,
            roles: new_user.roles,
        };
        accounts.by_id.insert(
            id,
            StoredUser {
                user: user.clone(),
                password_hash,
            },
        );
        Ok(user)
    }

    /// Replace the roles of an existing account.
    pub async fn set_roles(&self, id: u64, roles: Vec<String>) -> Result<User, UserStoreError> {
        let mut accounts = self.accounts.write().await;
        let stored = accounts
            .by_id
            .get_mut(&id)
            .ok_or(UserStoreError::NotFound(id))?;
        stored.user.capabilities = capabilities_for(&roles);
        stored.user.roles = roles;
        Ok(stored.user.clone())
    }

    /// Delete an account.
    pub async fn remove_user(&self, id: u64) -> Result<(), UserStoreError> {
        let mut accounts = self.accounts.write().await;
        accounts
            .by_id
            .remove(&id)
            .map(|_| ())
            .ok_or(UserStoreError::NotFound(id))
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn authenticate(&self, login: &str, password: &str) -> Result<User, UserStoreError> {
        let (user, password_hash) = {
            let accounts = self.accounts.read().await;
            match accounts.by_id.values().find(|stored| {
                stored.user.username == login
                    || (login.contains('@') && stored.user.email.eq_ignore_ascii_case(login))
            }) {
                Some(stored) => (Some(stored.user.clone()), stored.password_hash.clone()),
                None => (None, self.decoy_hash.clone()),
            }
        };

        let verified = verify_password(password, password_hash).await?;

        match user {
            Some(user) if verified => Ok(user),
            _ => Err(UserStoreError::InvalidCredentials),
        }
    }

    async fn get_by_id(&self, id: u64) -> Result<User, UserStoreError> {
        let accounts = self.accounts.read().await;
        accounts
            .by_id
            .get(&id)
            .map(|stored| stored.user.clone())
            .ok_or(UserStoreError::NotFound(id))
    }
}

fn decoy_hash(cost: u32) -> String {
    // An empty hash fails verification instantly; bcrypt only rejects costs
    // that `insert_user` would reject too.
    bcrypt::hash(DECOY_PASSWORD, cost).unwrap_or_default()
}

async fn verify_password(password: &str, hash: String) -> Result<bool, UserStoreError> {
    let password = password.to_string();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| UserStoreError::Unavailable(e.to_string()))?
        .unwrap_or(false);
    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, password: &str, roles: &[&str]) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            display_name: None,
            password: password.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn store() -> InMemoryUserStore {
        InMemoryUserStore::with_hash_cost(4)
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = store();
        let first = store.insert_user(new_user("admin", "pw", &["administrator"])).await.unwrap();
        let second = store.insert_user(new_user("jane", "pw", &["author"])).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.display_name, "admin");
        assert!(first.capabilities.contains(&"manage_options".to_string()));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = store();
        store.insert_user(new_user("admin", "pw", &[])).await.unwrap();
        let err = store.insert_user(new_user("admin", "pw2", &[])).await.unwrap_err();
        assert_eq!(err, UserStoreError::Conflict("admin".to_string()));
    }

    #[tokio::test]
    async fn authenticate_accepts_login_or_email() {
        let store = store();
        let user = store.insert_user(new_user("admin", "correct-pw", &[])).await.unwrap();

        assert_eq!(store.authenticate("admin", "correct-pw").await.unwrap(), user);
        assert_eq!(
            store.authenticate("ADMIN@example.com", "correct-pw").await.unwrap(),
            user
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let store = store();
        store.insert_user(new_user("admin", "correct-pw", &[])).await.unwrap();

        assert_eq!(
            store.authenticate("admin", "wrong-pw").await.unwrap_err(),
            UserStoreError::InvalidCredentials
        );
        assert_eq!(
            store.authenticate("nobody", "correct-pw").await.unwrap_err(),
            UserStoreError::InvalidCredentials
        );
    }

    #[test]
    fn decoy_hash_uses_store_cost() {
        let store = InMemoryUserStore::with_hash_cost(5);
        assert!(store.decoy_hash.starts_with("$2b$05$"));
        assert!(bcrypt::verify(DECOY_PASSWORD, &store.decoy_hash).unwrap());
    }

    #[tokio::test]
    async fn decoy_password_never_authenticates_unknown_login() {
        let store = store();
        assert_eq!(
            store.authenticate("nobody", DECOY_PASSWORD).await.unwrap_err(),
            UserStoreError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn unknown_login_pays_for_password_check() {
        let store = InMemoryUserStore::with_hash_cost(8);
        store.insert_user(new_user("admin", "correct-pw", &[])).await.unwrap();

        let started = std::time::Instant::now();
        let _ = store.authenticate("admin", "wrong-pw").await;
        let known = started.elapsed();

        let started = std::time::Instant::now();
        let _ = store.authenticate("nobody", "wrong-pw").await;
        let unknown = started.elapsed();

        assert!(
            unknown * 4 >= known,
            "unknown login took {unknown:?}, known login took {known:?}"
        );
    }

    #[tokio::test]
    async fn set_roles_updates_capabilities() {
        let store = store();
        let user = store.insert_user(new_user("jane", "pw", &["subscriber"])).await.unwrap();
        assert!(!user.capabilities.contains(&"publish_posts".to_string()));

        store.set_roles(user.id, vec!["author".to_string()]).await.unwrap();
        let reread = store.get_by_id(user.id).await.unwrap();
        assert_eq!(reread.roles, vec!["author".to_string()]);
        assert!(reread.capabilities.contains(&"publish_posts".to_string()));
    }

    #[tokio::test]
    async fn removed_user_is_not_found() {
        let store = store();
        let user = store.insert_user(new_user("jane", "pw", &[])).await.unwrap();
        store.remove_user(user.id).await.unwrap();
        assert_eq!(
            store.get_by_id(user.id).await.unwrap_err(),
            UserStoreError::NotFound(user.id)
        );
    }
}
