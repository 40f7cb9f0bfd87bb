//! Guard configuration loading and validation

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AccessError, Result};

/// How the subject name is turned into a permission-store key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum SubjectNameTransform {
    /// Prepend a fixed namespace so user names cannot collide with role names
    Prefix(String),
    /// Use the name as-is
    Identity,
}

impl SubjectNameTransform {
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Prefix(prefix) => format!("{}{}", prefix, name),
            Self::Identity => name.to_string(),
        }
    }
}

impl Default for SubjectNameTransform {
    fn default() -> Self {
        Self::Prefix("u-".to_string())
    }
}

/// Request part that carries the related token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCarrier {
    #[default]
    Body,
    Query,
}

/// Secondary token settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTokenConfig {
    #[serde(default)]
    pub carrier: TokenCarrier,

    /// Field name inside the carrier
    #[serde(default = "default_related_field")]
    pub field: String,

    /// Signing secret of related tokens, independent from the primary secret
    pub secret: String,

    /// Scheme prefix of related tokens
    #[serde(default = "default_related_format")]
    pub format: String,
}

impl RelatedTokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            carrier: TokenCarrier::default(),
            field: default_related_field(),
            secret: secret.into(),
            format: default_related_format(),
        }
    }
}

/// Complete guard configuration
///
/// Every optional field has its default spelled out in a `default_*` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Primary token secret
    pub secret: String,

    /// Scheme prefix of the primary token (e.g. `Bearer`, `JWT`)
    #[serde(default = "default_token_format")]
    pub token_format: String,

    /// Header holding the primary token, lowercase
    #[serde(default = "default_authorization_header")]
    pub authorization_header: String,

    /// Claim holding the caller identity object
    #[serde(default = "default_user_key")]
    pub user_key: String,

    /// Field of the identity object holding the subject name
    #[serde(default = "default_username_key")]
    pub username_key: String,

    /// Field of the identity object holding the subject id
    #[serde(default = "default_user_id_key")]
    pub user_id_key: String,

    /// Claim holding typed resource grants
    #[serde(default = "default_resources_key")]
    pub resources_key: String,

    #[serde(default)]
    pub subject_name: SubjectNameTransform,

    /// Defaults to the primary secret when omitted from a config file
    #[serde(default)]
    pub related_token: Option<RelatedTokenConfig>,
}

fn default_token_format() -> String { "Bearer".to_string() }
fn default_authorization_header() -> String { "authorization".to_string() }
fn default_user_key() -> String { "user".to_string() }
fn default_username_key() -> String { "name".to_string() }
fn default_user_id_key() -> String { "id".to_string() }
fn default_resources_key() -> String { "resources".to_string() }
fn default_related_field() -> String { "token".to_string() }
fn default_related_format() -> String { "JWT".to_string() }

impl GuardConfig {
    /// Configuration with every default and the given primary secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            token_format: default_token_format(),
            authorization_header: default_authorization_header(),
            user_key: default_user_key(),
            username_key: default_username_key(),
            user_id_key: default_user_id_key(),
            resources_key: default_resources_key(),
            subject_name: SubjectNameTransform::default(),
            related_token: None,
        }
    }

    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .context("Failed to read guard configuration file")?;

        let config: GuardConfig = toml::from_str(&contents)
            .context("Failed to parse guard configuration file")?;

        Ok(config)
    }

    pub fn with_related_token(mut self, related: RelatedTokenConfig) -> Self {
        self.related_token = Some(related);
        self
    }

    pub fn with_subject_name(mut self, transform: SubjectNameTransform) -> Self {
        self.subject_name = transform;
        self
    }

    /// Related-token settings, falling back to the primary secret
    pub fn related(&self) -> RelatedTokenConfig {
        self.related_token
            .clone()
            .unwrap_or_else(|| RelatedTokenConfig::new(self.secret.clone()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(AccessError::InvalidConfig("secret must not be empty".to_string()));
        }

        let keys = [
            ("authorization_header", &self.authorization_header),
            ("user_key", &self.user_key),
            ("username_key", &self.username_key),
            ("user_id_key", &self.user_id_key),
            ("resources_key", &self.resources_key),
        ];
        for (name, value) in keys {
            if value.is_empty() {
                return Err(AccessError::InvalidConfig(format!("{} must not be empty", name)));
            }
        }

        if let Some(related) = &self.related_token {
            if related.secret.is_empty() {
                return Err(AccessError::InvalidConfig(
                    "related_token.secret must not be empty".to_string(),
                ));
            }
            if related.field.is_empty() {
                return Err(AccessError::InvalidConfig(
                    "related_token.field must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
