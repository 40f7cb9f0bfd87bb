//! Collection narrowing for own-scope listings
//!
//! When a caller may only list the resources it owns, the guard hands the
//! owned identifiers to a [`CollectionFilter`], which records a predicate in
//! the request-scoped [`FilterSet`] for the data layer to apply.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::matcher::textual_eq;
use crate::request::InboundRequest;
use crate::types::ResourceGrant;

/// Comparison applied by a [`QueryFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "eq")]
    Eq,
    #[serde(rename = "ned")]
    Diff,
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "lt")]
    Lt,
    #[serde(rename = "leq")]
    Leq,
    #[serde(rename = "gt")]
    Gt,
    #[serde(rename = "geq")]
    Geq,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
}

/// One predicate on a named field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub name: String,
    pub values: Vec<Value>,
    pub operator: FilterOperator,
}

impl QueryFilter {
    pub fn new(name: impl Into<String>, values: Vec<Value>, operator: FilterOperator) -> Self {
        Self {
            name: name.into(),
            values,
            operator,
        }
    }
}

/// Request-scoped predicates understood by the downstream data layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    filters: Vec<QueryFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: QueryFilter) {
        self.filters.push(filter);
    }

    pub fn get(&self, name: &str, operator: FilterOperator) -> Option<&QueryFilter> {
        self.filters
            .iter()
            .find(|f| f.name == name && f.operator == operator)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryFilter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Install `name in values`, intersecting with an existing `in` filter on `name`
    pub fn restrict_in(&mut self, name: &str, values: &[Value]) {
        match self
            .filters
            .iter_mut()
            .find(|f| f.name == name && f.operator == FilterOperator::In)
        {
            Some(existing) => {
                existing
                    .values
                    .retain(|kept| values.iter().any(|v| textual_eq(kept, v)));
            }
            None => self.push(QueryFilter::new(name, values.to_vec(), FilterOperator::In)),
        }
    }
}

/// Narrows a collection request to the caller's owned identifiers
pub trait CollectionFilter: Send + Sync {
    fn apply(&self, request: &mut InboundRequest, owned_ids: &[Value], resource: &str);
}

impl<F> CollectionFilter for F
where
    F: Fn(&mut InboundRequest, &[Value], &str) + Send + Sync,
{
    fn apply(&self, request: &mut InboundRequest, owned_ids: &[Value], resource: &str) {
        self(request, owned_ids, resource)
    }
}

/// Default filter: `<field> in {owned ids}`
#[derive(Debug, Clone)]
pub struct IdFilter {
    field: String,
}

impl IdFilter {
    pub fn new() -> Self {
        Self::on_field("id")
    }

    pub fn on_field(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl Default for IdFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionFilter for IdFilter {
    fn apply(&self, request: &mut InboundRequest, owned_ids: &[Value], resource: &str) {
        debug!(resource, field = %self.field, count = owned_ids.len(), "restricting collection");
        request.filters.restrict_in(&self.field, owned_ids);
    }
}

/// Identifiers of the caller's grants for `resource`
///
/// Typed grants whose type is the resource name come first (by `fkey`), then
/// resource-keyed grants (by `id`); duplicates are dropped.
pub fn owned_identifiers(resource: &str, typed: &[ResourceGrant], keyed: &[ResourceGrant]) -> Vec<Value> {
    let typed_ids = typed
        .iter()
        .filter(|g| g.grant_type.as_deref() == Some(resource))
        .filter_map(|g| g.fkey.clone());
    let keyed_ids = keyed.iter().filter_map(|g| g.id.clone());

    let mut ids: Vec<Value> = Vec::new();
    for id in typed_ids.chain(keyed_ids) {
        if !id.is_null() && !ids.iter().any(|seen| textual_eq(seen, &id)) {
            ids.push(id);
        }
    }
    ids
}

/// Invoke `filter` once with the owned identifiers, if there are any
///
/// Returns whether the collaborator was called.
pub fn trigger(
    filter: &dyn CollectionFilter,
    request: &mut InboundRequest,
    resource: &str,
    owned_ids: &[Value],
) -> bool {
    if owned_ids.is_empty() {
        debug!(resource, "no owned identifiers, collection filter skipped");
        return false;
    }

    filter.apply(request, owned_ids, resource);
    true
}
