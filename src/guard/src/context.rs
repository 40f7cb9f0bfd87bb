//! Request context classification
//!
//! A route either lists a collection (no context) or targets one resource
//! located by `source`/`key`. Single-resource contexts are "specific" when
//! they declare a type discriminator and "dynamic" otherwise.

use crate::error::{AccessError, Result};
use crate::request::InboundRequest;
use crate::types::{RequestContext, RequestSource};
use serde_json::Value;

/// Where the target identifier lives in the inbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator<'a> {
    pub source: RequestSource,
    pub key: &'a str,
}

impl Locator<'_> {
    /// Target identifier, if the request carries one
    pub fn target_id(&self, request: &InboundRequest) -> Option<Value> {
        request.field(self.source, self.key)
    }
}

/// Classified shape of an authorization request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape<'a> {
    Collection,
    Specific {
        resource_type: &'a str,
        locator: Locator<'a>,
    },
    Dynamic {
        locator: Locator<'a>,
    },
}

/// True iff the context is absent or empty
pub fn is_collection_request(context: Option<&RequestContext>) -> bool {
    context.map_or(true, RequestContext::is_empty)
}

/// True iff the context declares a non-empty type
pub fn is_specific(context: &RequestContext) -> bool {
    context.resource_type.as_deref().map_or(false, |t| !t.is_empty())
}

/// Classify a context, rejecting partially populated ones
pub fn classify(context: Option<&RequestContext>) -> Result<RequestShape<'_>> {
    let Some(context) = context.filter(|c| !c.is_empty()) else {
        return Ok(RequestShape::Collection);
    };

    let source = context
        .source
        .ok_or_else(|| AccessError::InvalidContext("context.source is required".to_string()))?;

    if context.key.is_empty() {
        return Err(AccessError::InvalidContext("context.key is required".to_string()));
    }

    let locator = Locator {
        source,
        key: &context.key,
    };

    match context.resource_type.as_deref() {
        Some(resource_type) if is_specific(context) => Ok(RequestShape::Specific {
            resource_type,
            locator,
        }),
        _ => Ok(RequestShape::Dynamic { locator }),
    }
}
