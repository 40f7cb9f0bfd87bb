//! Authorization decision orchestration
//!
//! Sequences action mapping, primary-token verification, permission lookup,
//! context classification and the four strategies for one authorization
//! request, and ORs an ordered list of requests together.

pub mod decision;

pub use decision::{Authorizations, Decision, DenialReason, EntryFailure, Grant, Strategy};

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::claims::{ClaimExtractor, ClaimSet, Identity};
use crate::config::GuardConfig;
use crate::context::{classify, RequestShape};
use crate::error::{AccessError, Result};
use crate::filter::{owned_identifiers, trigger, CollectionFilter};
use crate::matcher::{check_dynamic, check_specific};
use crate::permission::{has_generic, has_own, Permission, PermissionQuery, PermissionStore};
use crate::related::{has_related_token, RelatedTokenChecker};
use crate::request::InboundRequest;
use crate::token::{JwtVerifier, TokenVerifier};
use crate::types::{map_action, ActionPair, AuthorizationRequest};

/// Strategy evaluation result, before the descriptor is attached
enum Outcome {
    Granted(Strategy),
    Denied(DenialReason),
}

/// Main authorization guard
///
/// # Pipeline
///
/// ```text
/// action → primary token → permission query → related token?
///                                              ├─ yes: bypass check
///                                              └─ no:  collection | specific | dynamic
/// ```
pub struct AccessGuard {
    config: GuardConfig,
    claims: ClaimExtractor,
    verifier: Arc<dyn TokenVerifier>,
    related: RelatedTokenChecker,
    store: Arc<dyn PermissionStore>,
    filter: Arc<dyn CollectionFilter>,
}

impl AccessGuard {
    pub fn builder(config: GuardConfig) -> AccessGuardBuilder {
        AccessGuardBuilder::new(config)
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Authorize one request
    ///
    /// Caller errors (unknown action, malformed context, missing related-token
    /// parameters) and primary-token failures are returned as `Err`; every
    /// legitimate denial is an `Ok` decision that is not authorized.
    pub async fn authorize(
        &self,
        request: &mut InboundRequest,
        entry: &AuthorizationRequest,
    ) -> Result<Decision> {
        let pair = map_action(&entry.action)?;
        let shape = classify(entry.context.as_ref())?;

        debug!(resource = %entry.resource, action = %entry.action, "authorization request");

        let header = request
            .header(&self.config.authorization_header)
            .unwrap_or_default();
        let claims = self
            .verifier
            .verify(header, &self.config.secret, &self.config.token_format)?;
        let identity = self.claims.identity(&claims)?;

        let subject = self.config.subject_name.apply(&identity.name);
        let query = self.store.can(&subject).await?;

        let outcome = self.evaluate(request, entry, &pair, shape, &claims, &identity, query.as_ref())?;

        let decision = match outcome {
            Outcome::Granted(strategy) => {
                let permission = descriptor(query.as_ref(), pair.get(strategy.possession()), &entry.resource);
                Decision::allow(strategy, permission)
            }
            Outcome::Denied(reason) => Decision::deny(reason),
        };

        debug!(
            resource = %entry.resource,
            subject = %subject,
            authorized = decision.is_authorized(),
            strategy = ?decision.strategy(),
            "authorization decided"
        );

        Ok(decision)
    }

    /// Try `entries` in order and accept the first that authorizes
    ///
    /// Errors from one entry are recorded as its failure and do not stop the
    /// loop. Entries after the first success are never evaluated.
    pub async fn compute_authorizations(
        &self,
        request: &mut InboundRequest,
        entries: &[AuthorizationRequest],
    ) -> Authorizations {
        let mut failures = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let reason = match self.authorize(request, entry).await {
                Ok(decision) if decision.is_authorized() => {
                    return Authorizations::Granted { index, decision };
                }
                Ok(decision) => decision.reason().unwrap_or_default(),
                Err(e) => {
                    warn!(index, resource = %entry.resource, action = %entry.action, error = %e, "authorization entry failed");
                    e.to_string()
                }
            };

            failures.push(EntryFailure {
                index,
                resource: entry.resource.clone(),
                action: entry.action.clone(),
                reason,
            });
        }

        Authorizations::Denied { failures }
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        request: &mut InboundRequest,
        entry: &AuthorizationRequest,
        pair: &ActionPair,
        shape: RequestShape<'_>,
        claims: &ClaimSet,
        identity: &Identity,
        query: &dyn PermissionQuery,
    ) -> Result<Outcome> {
        let resource = entry.resource.as_str();
        let related = self.config.related();

        if has_related_token(request.carrier(related.carrier), &related.field)? {
            let token = request
                .carrier(related.carrier)
                .and_then(|carrier| carrier.get(&related.field))
                .and_then(Value::as_str)
                .unwrap_or_default();

            // A non-string token is present but cannot verify
            let valid = if token.is_empty() {
                false
            } else {
                self.related.check_related(identity, token, resource)?
            };

            return Ok(if valid {
                Outcome::Granted(Strategy::RelatedBypass)
            } else {
                Outcome::Denied(DenialReason::RelatedTokenRejected)
            });
        }

        if has_generic(query, pair, resource) {
            return Ok(Outcome::Granted(Strategy::Generic));
        }

        if !has_own(query, pair, resource) {
            return Ok(Outcome::Denied(DenialReason::NoGrant));
        }

        let outcome = match shape {
            RequestShape::Collection => {
                let owned = owned_identifiers(
                    resource,
                    &self.claims.typed_grants(claims),
                    &self.claims.keyed_grants(claims, resource),
                );
                trigger(self.filter.as_ref(), request, resource, &owned);
                Outcome::Granted(Strategy::OwnCollection)
            }
            RequestShape::Specific { resource_type, locator } => match locator.target_id(request) {
                Some(target) if check_specific(resource_type, &target, &self.claims.typed_grants(claims)) => {
                    Outcome::Granted(Strategy::OwnSpecific)
                }
                Some(_) => Outcome::Denied(DenialReason::NotOwned),
                None => Outcome::Denied(DenialReason::MissingTarget),
            },
            RequestShape::Dynamic { locator } => match locator.target_id(request) {
                Some(target) if check_dynamic(&target, &self.claims.keyed_grants(claims, resource)) => {
                    Outcome::Granted(Strategy::OwnDynamic)
                }
                Some(_) => Outcome::Denied(DenialReason::NotOwned),
                None => Outcome::Denied(DenialReason::MissingTarget),
            },
        };

        Ok(outcome)
    }
}

/// Store descriptor for the granted permission name
///
/// A related bypass may authorize a subject the store knows nothing about;
/// the synthesized descriptor then names the pair but grants no attributes.
fn descriptor(query: &dyn PermissionQuery, action: &str, resource: &str) -> Permission {
    query
        .check(action, resource)
        .unwrap_or_else(|| Permission::ungranted(query.subject(), action, resource))
}

/// Eagerly validated construction of an [`AccessGuard`]
pub struct AccessGuardBuilder {
    config: GuardConfig,
    verifier: Option<Arc<dyn TokenVerifier>>,
    store: Option<Arc<dyn PermissionStore>>,
    filter: Option<Arc<dyn CollectionFilter>>,
}

impl AccessGuardBuilder {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            verifier: None,
            store: None,
            filter: None,
        }
    }

    /// Token verifier for primary and related tokens (default: HS256 JWT)
    pub fn verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn permission_store(mut self, store: Arc<dyn PermissionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Collaborator narrowing own-scope collection requests
    pub fn filter(mut self, filter: Arc<dyn CollectionFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn build(self) -> Result<AccessGuard> {
        self.config.validate()?;

        let store = self
            .store
            .ok_or_else(|| AccessError::InvalidConfig("a permission store is required".to_string()))?;
        let filter = self.filter.ok_or(AccessError::FilterNotConfigured)?;
        let verifier = self
            .verifier
            .unwrap_or_else(|| Arc::new(JwtVerifier::new()));

        let related = RelatedTokenChecker::new(verifier.clone(), &self.config.related());
        let claims = ClaimExtractor::new(&self.config);

        info!(
            token_format = %self.config.token_format,
            related_carrier = ?self.config.related().carrier,
            "AccessGuard initialized"
        );

        Ok(AccessGuard {
            config: self.config,
            claims,
            verifier,
            related,
            store,
            filter,
        })
    }
}
