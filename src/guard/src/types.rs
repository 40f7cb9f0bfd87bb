//! Core authorization types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{AccessError, Result};

/// Abstract CRUD action declared on a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudAction {
    Create,
    Read,
    Update,
    Delete,
}

impl CrudAction {
    /// All actions, in declaration order
    pub const ALL: [CrudAction; 4] = [Self::Create, Self::Read, Self::Update, Self::Delete];

    /// Action name as written in route declarations
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Store permission names for this action
    pub fn pair(&self) -> ActionPair {
        match self {
            Self::Create => ActionPair { any: "createAny", own: "createOwn" },
            Self::Read => ActionPair { any: "readAny", own: "readOwn" },
            Self::Update => ActionPair { any: "updateAny", own: "updateOwn" },
            Self::Delete => ActionPair { any: "deleteAny", own: "deleteOwn" },
        }
    }
}

impl FromStr for CrudAction {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(AccessError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for CrudAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Possession scope of a grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Possession {
    /// Every instance of the resource type
    Any,
    /// Only instances the subject is entitled to
    Own,
}

impl Possession {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Own => "own",
        }
    }
}

impl fmt::Display for Possession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete store permission names for one CRUD action
///
/// Only obtainable through [`map_action`] or [`CrudAction::pair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPair {
    any: &'static str,
    own: &'static str,
}

impl ActionPair {
    /// Generic (any-scope) permission name
    pub fn any(&self) -> &'static str {
        self.any
    }

    /// Owned (own-scope) permission name
    pub fn own(&self) -> &'static str {
        self.own
    }

    /// Permission name for the given possession
    pub fn get(&self, possession: Possession) -> &'static str {
        match possession {
            Possession::Any => self.any,
            Possession::Own => self.own,
        }
    }
}

/// Map an abstract action name to the store's any/own permission names
pub fn map_action(action: &str) -> Result<ActionPair> {
    action.parse::<CrudAction>().map(|crud| crud.pair())
}

/// Where in the inbound request the target identifier lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestSource {
    Params,
    Query,
    Body,
    Headers,
}

impl FromStr for RequestSource {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "params" => Ok(Self::Params),
            "query" => Ok(Self::Query),
            "body" => Ok(Self::Body),
            "headers" => Ok(Self::Headers),
            other => Err(AccessError::InvalidContext(format!("unknown source '{}'", other))),
        }
    }
}

/// Locator for the single resource a route targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Declared resource subtype, enables specific matching
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Request part holding the identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RequestSource>,

    /// Field name of the identifier inside `source`
    #[serde(default)]
    pub key: String,
}

impl RequestContext {
    /// Context whose target type is implicit
    pub fn dynamic(source: RequestSource, key: impl Into<String>) -> Self {
        Self {
            resource_type: None,
            source: Some(source),
            key: key.into(),
        }
    }

    /// Context with an explicit type discriminator
    pub fn specific(
        resource_type: impl Into<String>,
        source: RequestSource,
        key: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            source: Some(source),
            key: key.into(),
        }
    }

    /// True when no field is populated (the `{}` declaration)
    pub fn is_empty(&self) -> bool {
        self.resource_type.as_deref().map_or(true, str::is_empty)
            && self.source.is_none()
            && self.key.is_empty()
    }
}

/// One resource/action check declared on a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Resource name as known to the permission store
    pub resource: String,

    /// Action name, validated when the request is evaluated
    pub action: String,

    /// Absent for collection-level routes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<RequestContext>,
}

impl AuthorizationRequest {
    /// Collection-level check
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
            context: None,
        }
    }

    /// Attach a single-resource context
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// One resource instance the caller holds under "own" scope
///
/// Typed grants (the `resources` claim) identify the instance with `fkey`;
/// resource-keyed grants identify it with `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceGrant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fkey: Option<Value>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub grant_type: Option<String>,
}

impl ResourceGrant {
    /// Typed grant, as carried in the `resources` claim
    pub fn typed(grant_type: impl Into<String>, fkey: impl Into<Value>) -> Self {
        Self {
            id: None,
            fkey: Some(fkey.into()),
            grant_type: Some(grant_type.into()),
        }
    }

    /// Untyped grant, as carried in a resource-keyed claim
    pub fn keyed(id: impl Into<Value>) -> Self {
        Self {
            id: Some(id.into()),
            fkey: None,
            grant_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_map_action_table() {
        assert_eq!(map_action("create").unwrap(), ActionPair { any: "createAny", own: "createOwn" });
        assert_eq!(map_action("read").unwrap(), ActionPair { any: "readAny", own: "readOwn" });
        assert_eq!(map_action("update").unwrap(), ActionPair { any: "updateAny", own: "updateOwn" });
        assert_eq!(map_action("delete").unwrap(), ActionPair { any: "deleteAny", own: "deleteOwn" });
    }

    #[test]
    fn test_map_action_rejects_unknown() {
        assert!(matches!(map_action("publish"), Err(AccessError::InvalidAction(a)) if a == "publish"));
        assert!(matches!(map_action(""), Err(AccessError::InvalidAction(_))));
        assert!(matches!(map_action("Read"), Err(AccessError::InvalidAction(_))));
    }

    #[test]
    fn test_action_pair_by_possession() {
        let pair = CrudAction::Update.pair();
        assert_eq!(pair.get(Possession::Any), "updateAny");
        assert_eq!(pair.get(Possession::Own), "updateOwn");
    }

    #[test]
    fn test_route_declaration_deserializes() {
        let declared: AuthorizationRequest = serde_json::from_value(serde_json::json!({
            "resource": "foo",
            "action": "read",
            "context": { "type": "foo", "source": "params", "key": "fooId" }
        }))
        .unwrap();

        assert_eq!(
            declared.context,
            Some(RequestContext::specific("foo", RequestSource::Params, "fooId"))
        );
    }

    #[test]
    fn test_empty_context_object() {
        let declared: AuthorizationRequest = serde_json::from_value(serde_json::json!({
            "resource": "bar",
            "action": "read",
            "context": {}
        }))
        .unwrap();

        assert!(declared.context.unwrap().is_empty());
        assert!(!RequestContext::dynamic(RequestSource::Params, "id").is_empty());
    }

    #[test]
    fn test_resource_grant_shapes() {
        let typed: ResourceGrant =
            serde_json::from_value(serde_json::json!({ "type": "profile", "fkey": "1" })).unwrap();
        assert_eq!(typed, ResourceGrant::typed("profile", "1"));

        let keyed: ResourceGrant = serde_json::from_value(serde_json::json!({ "id": 7 })).unwrap();
        assert_eq!(keyed, ResourceGrant::keyed(7));
    }

    proptest! {
        #[test]
        fn prop_map_action_accepts_only_crud(action in "[a-zA-Z]{0,8}") {
            let known = CrudAction::ALL.iter().any(|crud| crud.as_str() == action);
            prop_assert_eq!(map_action(&action).is_ok(), known);
        }

        #[test]
        fn prop_pair_names_follow_action(idx in 0usize..4) {
            let crud = CrudAction::ALL[idx];
            let pair = map_action(crud.as_str()).unwrap();
            prop_assert_eq!(pair.any(), format!("{}Any", crud.as_str()));
            prop_assert_eq!(pair.own(), format!("{}Own", crud.as_str()));
        }
    }
}
