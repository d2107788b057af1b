//! Requester identity and per-query evaluation context.
//!
//! Every resolution, validation and sanitization call receives the requesting
//! [`User`] (or `None` for anonymous access) so that permission-dependent
//! collaborators can decide what the requester may see.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The user on whose behalf a query is evaluated.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl User {
    /// Creates a user with the given unique key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: None,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Returns the unique user key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the display name, falling back to the key.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.key)
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User({})", self.key)
    }
}

/// Context for a single query evaluation.
///
/// Also the cache key for resolved literals, so two contexts for the same
/// user share cached results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryContext {
    user: Option<User>,
}

impl QueryContext {
    /// Creates a context for the given user.
    pub fn new(user: Option<User>) -> Self {
        Self { user }
    }

    /// Creates a context for an anonymous requester.
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// Returns the requesting user, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_display_name_fallback() {
        let user = User::new("kim");
        assert_eq!(user.display_name(), "kim");
        let user = user.with_display_name("Kim Lee");
        assert_eq!(user.display_name(), "Kim Lee");
        assert_eq!(user.key(), "kim");
    }

    #[test]
    fn test_query_context() {
        let ctx = QueryContext::new(Some(User::new("kim")));
        assert_eq!(ctx.user().map(User::key), Some("kim"));
        assert_eq!(ctx, QueryContext::new(Some(User::new("kim"))));
        assert_ne!(ctx, QueryContext::anonymous());
        assert!(QueryContext::anonymous().user().is_none());
        assert_eq!(QueryContext::default(), QueryContext::anonymous());
    }
}
