//! Related-token bypass
//!
//! A related token is a secondary, narrowly scoped credential committing to
//! exactly one resource for one subject. When it validates, the request is
//! authorized regardless of the subject's general permissions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::claims::Identity;
use crate::config::RelatedTokenConfig;
use crate::error::{MissingParameter, Result};
use crate::token::{issue_token, TokenError, TokenVerifier};

/// What a related token commits to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedCommitment {
    pub resource: String,

    /// Subject id the token was minted for
    #[serde(rename = "user")]
    pub subject_id: Value,
}

#[derive(Debug, Deserialize)]
struct RelatedClaims {
    data: RelatedCommitment,
}

/// Non-null, non-empty string/array/object
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Whether the carrier holds a non-empty related token in `field`
///
/// Fails when the carrier itself is absent, not when it merely lacks the field.
pub fn has_related_token(carrier: Option<&Map<String, Value>>, field: &str) -> Result<bool> {
    let carrier = carrier.ok_or(MissingParameter::Body)?;
    Ok(carrier.get(field).map_or(false, is_present))
}

/// Validates related tokens with their own secret and scheme
#[derive(Clone)]
pub struct RelatedTokenChecker {
    verifier: Arc<dyn TokenVerifier>,
    secret: String,
    format: String,
}

impl RelatedTokenChecker {
    pub fn new(verifier: Arc<dyn TokenVerifier>, config: &RelatedTokenConfig) -> Self {
        Self {
            verifier,
            secret: config.secret.clone(),
            format: config.format.clone(),
        }
    }

    /// Decode and verify a related token
    pub fn commitment(&self, token: &str) -> std::result::Result<RelatedCommitment, TokenError> {
        let claims = self.verifier.verify(token, &self.secret, &self.format)?;
        serde_json::from_value::<RelatedClaims>(Value::Object(claims))
            .map(|claims| claims.data)
            .map_err(|e| TokenError::Malformed(format!("related token payload: {}", e)))
    }

    /// True iff the token verifies and commits to `resource` for the primary subject
    ///
    /// Empty `token`/`resource` are caller errors; a token that fails
    /// verification or commits elsewhere is a plain `false`.
    pub fn check_related(&self, primary: &Identity, token: &str, resource: &str) -> Result<bool> {
        if let Some(missing) = MissingParameter::for_related(token.is_empty(), resource.is_empty()) {
            return Err(missing.into());
        }

        let commitment = match self.commitment(token) {
            Ok(commitment) => commitment,
            Err(e) => {
                debug!(resource, error = %e, "related token rejected");
                return Ok(false);
            }
        };

        let matches = commitment.resource == resource
            && !primary.id.is_null()
            && commitment.subject_id == primary.id;

        debug!(resource, matches, "related token checked");
        Ok(matches)
    }
}

/// Mint a related token committing to `resource` for `subject_id`
pub fn issue_related_token(
    resource: &str,
    subject_id: impl Into<Value>,
    secret: &str,
    ttl: Duration,
) -> std::result::Result<String, TokenError> {
    issue_token(
        &json!({ "data": { "resource": resource, "user": subject_id.into() } }),
        secret,
        ttl,
    )
}
