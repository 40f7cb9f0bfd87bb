//! Permission store contract and grant evaluation
//!
//! A [`PermissionStore`] hands out one [`PermissionQuery`] per subject. The
//! query is string-keyed (`readAny`, `updateOwn`, ...) the same way the store
//! declares grants, and answers with a [`Permission`] descriptor or `None` when
//! the action/resource pair was never declared for the subject.

pub mod attributes;
pub mod store;

pub use store::{GrantBuilder, InMemoryPermissionStore, SubjectPermissions};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::ActionPair;

/// Descriptor of one declared grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Whether the grant is effective (declared-then-denied entries are `false`)
    pub granted: bool,

    /// Store key of the subject
    pub subject: String,

    /// Store permission name (e.g. `readOwn`)
    pub action: String,

    pub resource: String,

    /// Field selectors for downstream projection
    #[serde(default)]
    pub attributes: Vec<String>,
}

impl Permission {
    /// Descriptor for a pair the store has no entry for
    pub fn ungranted(
        subject: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            granted: false,
            subject: subject.into(),
            action: action.into(),
            resource: resource.into(),
            attributes: Vec::new(),
        }
    }

    /// Project a document onto the permitted attributes
    pub fn filter(&self, data: &Value) -> Value {
        attributes::filter_value(data, &self.attributes)
    }
}

/// Per-subject permission lookups
pub trait PermissionQuery: Send + Sync {
    /// Store key this query answers for
    fn subject(&self) -> &str;

    /// Whether the store knows the permission name at all
    fn supports(&self, action: &str) -> bool;

    /// Descriptor for `action` on `resource`, `None` if undeclared
    fn check(&self, action: &str, resource: &str) -> Option<Permission>;
}

/// Permission store backend
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Query object for a (transformed) subject name
    async fn can(&self, subject: &str) -> Result<Box<dyn PermissionQuery>>;
}

/// True only when the action is recognized, the pair is declared, and the grant is effective
pub fn has_permission(query: &dyn PermissionQuery, action: &str, resource: &str) -> bool {
    query.supports(action)
        && query
            .check(action, resource)
            .map_or(false, |permission| permission.granted)
}

/// Generic (any-scope) grant
pub fn has_generic(query: &dyn PermissionQuery, pair: &ActionPair, resource: &str) -> bool {
    has_permission(query, pair.any(), resource)
}

/// Owned (own-scope) grant
pub fn has_own(query: &dyn PermissionQuery, pair: &ActionPair, resource: &str) -> bool {
    has_permission(query, pair.own(), resource)
}
