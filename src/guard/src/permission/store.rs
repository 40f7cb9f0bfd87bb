//! In-memory permission store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Permission, PermissionQuery, PermissionStore};
use crate::error::Result;
use crate::types::CrudAction;

/// One declared (resource, action) entry
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    granted: bool,
    attributes: Vec<String>,
}

/// resource -> permission name -> rule
type SubjectRules = HashMap<String, HashMap<String, Rule>>;

/// subject -> shared rules; writers copy on write so handed-out snapshots stay fixed
type SubjectMap = HashMap<String, Arc<SubjectRules>>;

fn is_known_action(action: &str) -> bool {
    CrudAction::ALL
        .iter()
        .any(|crud| crud.pair().any() == action || crud.pair().own() == action)
}

/// Permission store backed by a map of subject rules
///
/// Rules are declared up front with [`grant`](Self::grant) / [`deny`](Self::deny)
/// and may be changed at runtime with [`put`](Self::put).
pub struct InMemoryPermissionStore {
    subjects: RwLock<SubjectMap>,
}

impl InMemoryPermissionStore {
    /// Create a new in-memory permission store
    pub fn new() -> Self {
        Self {
            subjects: RwLock::new(HashMap::new()),
        }
    }

    /// Start declaring granted rules for `subject`
    pub fn grant(&mut self, subject: impl Into<String>) -> GrantBuilder<'_> {
        GrantBuilder::new(self.subjects.get_mut(), subject.into(), true)
    }

    /// Start declaring denied rules for `subject`
    pub fn deny(&mut self, subject: impl Into<String>) -> GrantBuilder<'_> {
        GrantBuilder::new(self.subjects.get_mut(), subject.into(), false)
    }

    /// Insert or replace one rule
    pub async fn put(
        &self,
        subject: &str,
        action: &str,
        resource: &str,
        granted: bool,
        attributes: Vec<String>,
    ) {
        let mut subjects = self.subjects.write().await;
        Arc::make_mut(subjects.entry(subject.to_string()).or_default())
            .entry(resource.to_string())
            .or_default()
            .insert(action.to_string(), Rule { granted, attributes });
    }

    /// Remove every rule of a subject
    pub async fn revoke_subject(&self, subject: &str) -> bool {
        let mut subjects = self.subjects.write().await;
        subjects.remove(subject).is_some()
    }
}

impl Default for InMemoryPermissionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn can(&self, subject: &str) -> Result<Box<dyn PermissionQuery>> {
        let subjects = self.subjects.read().await;
        let rules = subjects.get(subject).map(Arc::clone).unwrap_or_default();

        Ok(Box::new(SubjectPermissions {
            subject: subject.to_string(),
            rules,
        }))
    }
}

/// Snapshot of one subject's rules, taken when the query was requested
#[derive(Debug, Clone)]
pub struct SubjectPermissions {
    subject: String,
    rules: Arc<SubjectRules>,
}

impl PermissionQuery for SubjectPermissions {
    fn subject(&self) -> &str {
        &self.subject
    }

    fn supports(&self, action: &str) -> bool {
        is_known_action(action)
    }

    fn check(&self, action: &str, resource: &str) -> Option<Permission> {
        let rule = self.rules.get(resource)?.get(action)?;

        Some(Permission {
            granted: rule.granted,
            subject: self.subject.clone(),
            action: action.to_string(),
            resource: resource.to_string(),
            attributes: rule.attributes.clone(),
        })
    }
}

/// Fluent rule declaration, e.g. `store.grant("u-bar").read_any("bar").read_own("foo")`
pub struct GrantBuilder<'a> {
    subjects: &'a mut SubjectMap,
    subject: String,
    granted: bool,
    attributes: Vec<String>,
}

impl<'a> GrantBuilder<'a> {
    fn new(subjects: &'a mut SubjectMap, subject: String, granted: bool) -> Self {
        let attributes = if granted { vec!["*".to_string()] } else { Vec::new() };
        Self {
            subjects,
            subject,
            granted,
            attributes,
        }
    }

    /// Attributes applied to the rules declared after this call
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    fn rule(self, action: &str, resource: &str) -> Self {
        let rule = Rule {
            granted: self.granted,
            attributes: self.attributes.clone(),
        };
        Arc::make_mut(self.subjects.entry(self.subject.clone()).or_default())
            .entry(resource.to_string())
            .or_default()
            .insert(action.to_string(), rule);
        self
    }

    pub fn create_any(self, resource: &str) -> Self { self.rule("createAny", resource) }
    pub fn create_own(self, resource: &str) -> Self { self.rule("createOwn", resource) }
    pub fn read_any(self, resource: &str) -> Self { self.rule("readAny", resource) }
    pub fn read_own(self, resource: &str) -> Self { self.rule("readOwn", resource) }
    pub fn update_any(self, resource: &str) -> Self { self.rule("updateAny", resource) }
    pub fn update_own(self, resource: &str) -> Self { self.rule("updateOwn", resource) }
    pub fn delete_any(self, resource: &str) -> Self { self.rule("deleteAny", resource) }
    pub fn delete_own(self, resource: &str) -> Self { self.rule("deleteOwn", resource) }
}
