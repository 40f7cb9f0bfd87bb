//! Authorization decision types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::permission::Permission;
use crate::types::Possession;

/// Strategy that authorized a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Valid related token, bypasses the subject's permissions
    RelatedBypass,
    /// Any-scope grant on the resource
    Generic,
    /// Own-scope grant matched against the typed grant list
    OwnSpecific,
    /// Own-scope grant matched against the resource-keyed grant list
    OwnDynamic,
    /// Own-scope grant on a collection, narrowed by the filter collaborator
    OwnCollection,
}

impl Strategy {
    /// Possession scope this strategy grants
    pub fn possession(&self) -> Possession {
        match self {
            Self::RelatedBypass | Self::Generic => Possession::Any,
            Self::OwnSpecific | Self::OwnDynamic | Self::OwnCollection => Possession::Own,
        }
    }
}

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Neither an any- nor an own-scope grant
    NoGrant,
    /// Own-scope grant, but the target is not among the caller's grants
    NotOwned,
    /// Own-scope grant, but the request carries no target identifier
    MissingTarget,
    /// Related token failed verification or commits elsewhere
    RelatedTokenRejected,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGrant => write!(f, "Insufficient privileges"),
            Self::NotOwned => write!(f, "Insufficient privileges: resource not owned"),
            Self::MissingTarget => write!(f, "Insufficient privileges: target identifier missing"),
            Self::RelatedTokenRejected => write!(f, "Insufficient privileges: related token rejected"),
        }
    }
}

/// What an authorized decision carries for downstream handlers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub strategy: Strategy,

    /// Scope the handler should restrict its query to
    pub scope: Possession,

    /// Store descriptor for `pair[scope]` on the resource
    pub permission: Permission,
}

/// Outcome of one authorization request
///
/// Built only through [`Decision::allow`] and [`Decision::deny`], so an
/// authorized decision always carries a grant and a denied one a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    authorized: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    grant: Option<Grant>,

    #[serde(skip_serializing_if = "Option::is_none")]
    denial: Option<DenialReason>,
}

impl Decision {
    /// Allow decision
    pub fn allow(strategy: Strategy, permission: Permission) -> Self {
        Self {
            authorized: true,
            grant: Some(Grant {
                strategy,
                scope: strategy.possession(),
                permission,
            }),
            denial: None,
        }
    }

    /// Deny decision
    pub fn deny(reason: DenialReason) -> Self {
        Self {
            authorized: false,
            grant: None,
            denial: Some(reason),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    pub fn grant(&self) -> Option<&Grant> {
        self.grant.as_ref()
    }

    pub fn denial(&self) -> Option<DenialReason> {
        self.denial
    }

    pub fn granted_scope(&self) -> Option<Possession> {
        self.grant.as_ref().map(|g| g.scope)
    }

    pub fn strategy(&self) -> Option<Strategy> {
        self.grant.as_ref().map(|g| g.strategy)
    }

    pub fn permission(&self) -> Option<&Permission> {
        self.grant.as_ref().map(|g| &g.permission)
    }

    /// Human-readable denial message, `None` when authorized
    pub fn reason(&self) -> Option<String> {
        self.denial.map(|d| d.to_string())
    }
}

/// Why one entry of a multi-authorization list did not authorize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFailure {
    /// Position in the declared list
    pub index: usize,
    pub resource: String,
    pub action: String,
    /// Denial message or error message
    pub reason: String,
}

/// Outcome of an ordered OR across authorization requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Authorizations {
    /// First entry that authorized
    Granted { index: usize, decision: Decision },
    /// Every entry failed, in declaration order
    Denied { failures: Vec<EntryFailure> },
}

impl Authorizations {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    pub fn decision(&self) -> Option<&Decision> {
        match self {
            Self::Granted { decision, .. } => Some(decision),
            Self::Denied { .. } => None,
        }
    }

    pub fn failures(&self) -> &[EntryFailure] {
        match self {
            Self::Granted { .. } => &[],
            Self::Denied { failures } => failures,
        }
    }

    pub fn into_result(self) -> Result<Decision, Vec<EntryFailure>> {
        match self {
            Self::Granted { decision, .. } => Ok(decision),
            Self::Denied { failures } => Err(failures),
        }
    }
}
