// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content roles and the capabilities they grant.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Built-in roles.
///
/// ## Role Hierarchy
///
/// - `Administrator` - Everything, including user and site management
/// - `Editor` - Publish and manage everyone's content
/// - `Author` - Publish and manage own content
/// - `Contributor` - Write own drafts, cannot publish
/// - `Subscriber` - Read only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Editor,
    Author,
    Contributor,
    Subscriber,
}

const SUBSCRIBER_CAPS: &[&str] = &["read"];
const CONTRIBUTOR_CAPS: &[&str] = &["edit_posts", "delete_posts"];
const AUTHOR_CAPS: &[&str] = &[
    "upload_files",
    "publish_posts",
    "edit_published_posts",
    "delete_published_posts",
];
const EDITOR_CAPS: &[&str] = &[
    "moderate_comments",
    "manage_categories",
    "edit_others_posts",
    "delete_others_posts",
    "edit_pages",
    "publish_pages",
    "edit_others_pages",
    "delete_pages",
    "unfiltered_html",
];
const ADMINISTRATOR_CAPS: &[&str] = &[
    "manage_options",
    "list_users",
    "create_users",
    "edit_users",
    "delete_users",
    "promote_users",
    "edit_theme_options",
    "activate_plugins",
];

impl Role {
    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "administrator" => Some(Role::Administrator),
            "editor" => Some(Role::Editor),
            "author" => Some(Role::Author),
            "contributor" => Some(Role::Contributor),
            "subscriber" => Some(Role::Subscriber),
            _ => None,
        }
    }

    /// Capabilities granted by this role, lower tiers included.
    pub fn capabilities(&self) -> Vec<&'static str> {
        let tiers: &[&[&str]] = match self {
            Role::Subscriber => &[SUBSCRIBER_CAPS],
            Role::Contributor => &[SUBSCRIBER_CAPS, CONTRIBUTOR_CAPS],
            Role::Author => &[SUBSCRIBER_CAPS, CONTRIBUTOR_CAPS, AUTHOR_CAPS],
            Role::Editor => &[SUBSCRIBER_CAPS, CONTRIBUTOR_CAPS, AUTHOR_CAPS, EDITOR_CAPS],
            Role::Administrator => &[
                SUBSCRIBER_CAPS,
                CONTRIBUTOR_CAPS,
                AUTHOR_CAPS,
                EDITOR_CAPS,
                ADMINISTRATOR_CAPS,
            ],
        };
        tiers.iter().flat_map(|caps| caps.iter().copied()).collect()
    }
}

/// Capabilities for a set of role names.
///
/// Sorted and deduplicated. Each known role also grants itself as a
/// capability; unknown role names grant nothing.
pub fn capabilities_for(roles: &[String]) -> Vec<String> {
    let mut caps: Vec<String> = roles
        .iter()
        .filter_map(|name| Role::from_str(name))
        .flat_map(|role| {
            role.capabilities()
                .into_iter()
                .map(str::to_string)
                .chain(std::iter::once(role.to_string()))
        })
        .collect();
    caps.sort();
    caps.dedup();
    caps
}

impl Default for Role {
    /// Default role for new accounts (least privilege).
    fn default() -> Self {
        Role::Subscriber
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Administrator => write!(f, "administrator"),
            Role::Editor => write!(f, "editor"),
            Role::Author => write!(f, "author"),
            Role::Contributor => write!(f, "contributor"),
            Role::Subscriber => write!(f, "subscriber"),
        }
    }
}
