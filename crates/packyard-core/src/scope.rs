//! Access scopes.
//!
//! Every request is reduced to an [`AccessScope`] once, at the boundary,
//! before any cache key is derived or the builder is invoked.

use std::fmt;

/// The caller of a protocol endpoint, as seen by the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
}

impl Principal {
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

/// Authorization decision supplied by the host.
pub trait AccessPolicy: Send + Sync {
    /// Whether the principal holds the maintainer capability and may see
    /// every package.
    fn is_privileged(&self, principal: &Principal) -> bool;
}

/// Policy under which nobody is privileged.
pub struct NoPrivileges;

impl AccessPolicy for NoPrivileges {
    fn is_privileged(&self, _principal: &Principal) -> bool {
        false
    }
}

/// Policy granting privileges to a fixed set of user IDs.
pub struct PrivilegedUsers(pub Vec<i64>);

impl AccessPolicy for PrivilegedUsers {
    fn is_privileged(&self, principal: &Principal) -> bool {
        self.0.contains(&principal.user_id)
    }
}

/// Effective viewing identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessScope {
    /// Unfiltered graph. Anonymous callers and privileged principals.
    Anonymous,
    /// Graph restricted to the packages granted to the user.
    Identified(i64),
}

impl AccessScope {
    /// Normalizes a principal into a scope. Privileged principals collapse to
    /// [`AccessScope::Anonymous`] so they share the unfiltered cache entry.
    pub fn for_principal(principal: Option<&Principal>, policy: &dyn AccessPolicy) -> Self {
        match principal {
            Some(principal) if !policy.is_privileged(principal) => {
                Self::Identified(principal.user_id)
            }
            _ => Self::Anonymous,
        }
    }

    /// Scope id used in cache keys and events; `0` for anonymous.
    pub fn id(&self) -> i64 {
        match self {
            Self::Anonymous => 0,
            Self::Identified(user_id) => *user_id,
        }
    }

    pub fn cache_key(&self) -> String {
        format!("pkg_user_{}", self.id())
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Anonymous => None,
            Self::Identified(user_id) => Some(*user_id),
        }
    }
}

impl fmt::Display for AccessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Identified(user_id) => write!(f, "user:{user_id}"),
        }
    }
}
