//! Error types for the authorization guard

use std::fmt;
use thiserror::Error;

use crate::token::TokenError;

/// Parameters the related-token checks require
///
/// The message table is fixed: callers match on these strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingParameter {
    /// The related-token carrier (request body or query) is absent
    Body,
    /// The related token string is empty
    Token,
    /// The requested resource name is empty
    Resource,
    /// Both the token and the resource are empty
    TokenAndResource,
}

impl MissingParameter {
    /// Pick the variant naming exactly which related-token inputs are missing
    pub fn for_related(token_missing: bool, resource_missing: bool) -> Option<Self> {
        match (token_missing, resource_missing) {
            (false, false) => None,
            (true, false) => Some(Self::Token),
            (false, true) => Some(Self::Resource),
            (true, true) => Some(Self::TokenAndResource),
        }
    }
}

impl fmt::Display for MissingParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => write!(f, "Missing parameter : body"),
            Self::Token => write!(f, "Missing parameter : token"),
            Self::Resource => write!(f, "Missing parameter : resource"),
            Self::TokenAndResource => write!(f, "Missing parameters : token, resource"),
        }
    }
}

/// Authorization guard errors
///
/// These are caller or collaborator failures. A legitimate denial is never an
/// error; it is a denied [`Decision`](crate::Decision).
#[derive(Debug, Error)]
pub enum AccessError {
    /// Action outside create/read/update/delete
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Required parameter absent
    #[error("{0}")]
    MissingParameter(MissingParameter),

    /// Token could not be verified
    #[error("Token verification failed: {0}")]
    TokenVerification(#[from] TokenError),

    /// Own-scope collection access is possible but no filter collaborator was supplied
    #[error("You must define a filter function for user with specifics/dynamics authorizations that need to access list resources")]
    FilterNotConfigured,

    /// Route declaration is malformed
    #[error("Invalid request context: {0}")]
    InvalidContext(String),

    /// Claim set lacks the caller identity
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    /// Guard configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Permission store backend failure
    #[error("Permission store error: {0}")]
    PermissionStore(String),
}

impl From<MissingParameter> for AccessError {
    fn from(missing: MissingParameter) -> Self {
        Self::MissingParameter(missing)
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AccessError>;
