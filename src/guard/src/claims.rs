//! Caller identity and grant extraction from decoded token payloads

use serde_json::Value;
use tracing::debug;

use crate::config::GuardConfig;
use crate::error::{AccessError, Result};
use crate::types::ResourceGrant;

/// Decoded token payload
pub type ClaimSet = serde_json::Map<String, Value>;

/// Authenticated caller as read from the claim set
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    /// Caller id, compared against related-token commitments
    pub id: Value,

    /// Display name, indexes the permission store after transformation
    pub name: String,
}

/// Reads identity and grant lists out of a [`ClaimSet`]
#[derive(Debug, Clone)]
pub struct ClaimExtractor {
    user_key: String,
    username_key: String,
    user_id_key: String,
    resources_key: String,
}

impl ClaimExtractor {
    /// Extractor using the key names from `config`
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            user_key: config.user_key.clone(),
            username_key: config.username_key.clone(),
            user_id_key: config.user_id_key.clone(),
            resources_key: config.resources_key.clone(),
        }
    }

    /// Caller identity sub-object
    ///
    /// The name is mandatory; a missing id is kept as `null` and never matches
    /// a related-token commitment.
    pub fn identity(&self, claims: &ClaimSet) -> Result<Identity> {
        let user = claims
            .get(&self.user_key)
            .and_then(Value::as_object)
            .ok_or_else(|| AccessError::InvalidClaims(format!("missing '{}' object", self.user_key)))?;

        let name = match user.get(&self.username_key) {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(AccessError::InvalidClaims(format!(
                    "missing '{}.{}'",
                    self.user_key, self.username_key
                )))
            }
        };

        let id = user.get(&self.user_id_key).cloned().unwrap_or(Value::Null);

        Ok(Identity { id, name })
    }

    /// Typed grants held under the reserved resources key
    pub fn typed_grants(&self, claims: &ClaimSet) -> Vec<ResourceGrant> {
        grant_list(claims, &self.resources_key)
    }

    /// Grants held under the resource's own name
    pub fn keyed_grants(&self, claims: &ClaimSet, resource: &str) -> Vec<ResourceGrant> {
        grant_list(claims, resource)
    }
}

/// Absent keys and non-array values yield no grants; malformed entries are skipped
fn grant_list(claims: &ClaimSet, key: &str) -> Vec<ResourceGrant> {
    let Some(entries) = claims.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<ResourceGrant>(entry.clone()) {
            Ok(grant) => Some(grant),
            Err(e) => {
                debug!(key, error = %e, "skipping malformed resource grant");
                None
            }
        })
        .collect()
}
