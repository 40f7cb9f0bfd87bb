//! Already-extracted inbound request fields
//!
//! The transport layer fills an [`InboundRequest`] per HTTP request; the guard
//! reads tokens and target identifiers from it and the collection filter
//! writes request-scoped predicates into [`InboundRequest::filters`].

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::config::TokenCarrier;
use crate::filter::FilterSet;
use crate::types::RequestSource;

#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// Header names are stored lowercase
    headers: HashMap<String, String>,

    /// Path parameters
    pub params: Map<String, Value>,

    /// Query string parameters
    pub query: Map<String, Value>,

    /// Parsed body; `None` when the transport produced no body object at all
    pub body: Option<Map<String, Value>>,

    /// Predicates for the downstream data layer
    pub filters: FilterSet,
}

impl InboundRequest {
    /// Request with an empty (but present) body
    pub fn new() -> Self {
        Self {
            headers: HashMap::new(),
            params: Map::new(),
            query: Map::new(),
            body: Some(Map::new()),
            filters: FilterSet::new(),
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Drop the body object entirely
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Field `key` of request part `source`
    pub fn field(&self, source: RequestSource, key: &str) -> Option<Value> {
        match source {
            RequestSource::Params => self.params.get(key).cloned(),
            RequestSource::Query => self.query.get(key).cloned(),
            RequestSource::Body => self.body.as_ref().and_then(|b| b.get(key)).cloned(),
            RequestSource::Headers => self.header(key).map(|v| Value::String(v.to_string())),
        }
    }

    /// The object that may carry a related token
    pub fn carrier(&self, carrier: TokenCarrier) -> Option<&Map<String, Value>> {
        match carrier {
            TokenCarrier::Body => self.body.as_ref(),
            TokenCarrier::Query => Some(&self.query),
        }
    }
}

impl Default for InboundRequest {
    fn default() -> Self {
        Self::new()
    }
}
