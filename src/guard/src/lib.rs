//! # CretoAI Access Guard
//!
//! Per-request authorization decisions for resource/action routes.
//!
//! ## Features
//!
//! - **CRUD action mapping** onto any/own permission pairs
//! - **Pluggable permission store** behind an async trait
//! - **Ownership matching** against typed and resource-keyed token grants
//! - **Related-token bypass** for narrowly scoped secondary credentials
//! - **Collection narrowing** through a request-scoped filter collaborator
//! - **Ordered OR** across several authorization requests
//!
//! ## Example
//!
//! ```rust
//! use cretoai_guard::{
//!     issue_token, AccessGuard, AuthorizationRequest, GuardConfig, IdFilter,
//!     InboundRequest, InMemoryPermissionStore, DEFAULT_TOKEN_TTL,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = InMemoryPermissionStore::new();
//!     store.grant("u-bar").read_any("bar");
//!
//!     let guard = AccessGuard::builder(GuardConfig::new("MySecret"))
//!         .permission_store(Arc::new(store))
//!         .filter(Arc::new(IdFilter::new()))
//!         .build()?;
//!
//!     let token = issue_token(&json!({ "user": { "id": 1, "name": "bar" } }), "MySecret", DEFAULT_TOKEN_TTL)?;
//!     let mut request = InboundRequest::new().with_header("Authorization", format!("Bearer {}", token));
//!
//!     let decision = guard
//!         .authorize(&mut request, &AuthorizationRequest::new("bar", "read"))
//!         .await?;
//!
//!     if decision.is_authorized() {
//!         println!("Access granted!");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod claims;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod permission;
pub mod related;
pub mod request;
pub mod token;
pub mod types;

// Re-export commonly used types
pub use claims::{ClaimExtractor, ClaimSet, Identity};
pub use config::{GuardConfig, RelatedTokenConfig, SubjectNameTransform, TokenCarrier};
pub use context::{classify, is_collection_request, is_specific, RequestShape};
pub use engine::{
    AccessGuard, AccessGuardBuilder, Authorizations, Decision, DenialReason, EntryFailure, Grant,
    Strategy,
};
pub use error::{AccessError, MissingParameter, Result};
pub use filter::{CollectionFilter, FilterOperator, FilterSet, IdFilter, QueryFilter};
pub use matcher::{check_dynamic, check_specific};
pub use permission::{InMemoryPermissionStore, Permission, PermissionQuery, PermissionStore};
pub use related::{issue_related_token, RelatedTokenChecker};
pub use request::InboundRequest;
pub use token::{issue_token, JwtVerifier, TokenError, TokenVerifier, DEFAULT_TOKEN_TTL};
pub use types::{
    map_action, ActionPair, AuthorizationRequest, CrudAction, Possession, RequestContext,
    RequestSource, ResourceGrant,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
