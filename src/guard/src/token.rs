//! Token verification and issuance
//!
//! The guard never inspects signatures itself; it hands the raw header or
//! related-token string to a [`TokenVerifier`]. [`JwtVerifier`] is the HS256
//! implementation used by default.

use std::time::Duration;

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;
use thiserror::Error;

use crate::claims::ClaimSet;

/// Default lifetime of issued tokens (seconds)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(10_080);

/// Token verification errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// No token supplied
    #[error("token is missing")]
    Missing,

    /// Signature does not match the secret
    #[error("invalid signature")]
    InvalidSignature,

    /// `exp` is in the past
    #[error("token expired")]
    Expired,

    /// Not a decodable token
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Signing failed while issuing
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Decodes a signed token string into a claim set
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` against `secret`, stripping the `format` scheme prefix first
    fn verify(&self, token: &str, secret: &str, format: &str) -> Result<ClaimSet, TokenError>;
}

/// HMAC-signed JWT verifier
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    algorithm: Algorithm,
    leeway: u64,
}

impl JwtVerifier {
    /// HS256 verifier with no clock leeway
    pub fn new() -> Self {
        Self {
            algorithm: Algorithm::HS256,
            leeway: 0,
        }
    }

    /// Use another HMAC algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Tolerated clock skew for `exp`/`nbf`, in seconds
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }
}

impl Default for JwtVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str, secret: &str, format: &str) -> Result<ClaimSet, TokenError> {
        let token = strip_scheme(token, format);
        if token.is_empty() {
            return Err(TokenError::Missing);
        }

        // `exp` is checked when present but not required
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway;
        validation.required_spec_claims.clear();

        let data = decode::<ClaimSet>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token verification failed");
                TokenError::from(e)
            })?;

        Ok(data.claims)
    }
}

/// Remove a leading scheme (e.g. `Bearer `) from a token string
///
/// The comparison ignores ASCII case; a string without the scheme is returned trimmed.
pub fn strip_scheme<'a>(raw: &'a str, format: &str) -> &'a str {
    let raw = raw.trim();
    if format.is_empty() {
        return raw;
    }

    match raw.get(..format.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(format) => {
            let rest = &raw[format.len()..];
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                rest.trim_start()
            } else {
                raw
            }
        }
        _ => raw,
    }
}

/// Sign `claims` as an HS256 JWT valid for `ttl`
///
/// `iat` and `exp` are set from the current time, overriding any supplied values.
pub fn issue_token(claims: &Value, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    let mut payload = match claims {
        Value::Object(map) => map.clone(),
        Value::Null => ClaimSet::new(),
        other => {
            return Err(TokenError::Signing(format!(
                "claims must be a JSON object, got {}",
                other
            )))
        }
    };

    let now = chrono::Utc::now().timestamp();
    let exp = i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or_else(|| TokenError::Signing(format!("ttl of {}s is out of range", ttl.as_secs())))?;

    payload.insert("iat".to_string(), Value::from(now));
    payload.insert("exp".to_string(), Value::from(exp));

    encode(&Header::default(), &payload, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| TokenError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_scheme() {
        assert_eq!(strip_scheme("Bearer abc.def", "Bearer"), "abc.def");
        assert_eq!(strip_scheme("bearer abc.def", "Bearer"), "abc.def");
        assert_eq!(strip_scheme("JWT abc.def", "JWT"), "abc.def");
        assert_eq!(strip_scheme("abc.def", "Bearer"), "abc.def");
        assert_eq!(strip_scheme("Bearerabc", "Bearer"), "Bearerabc");
        assert_eq!(strip_scheme("Bearer", "Bearer"), "");
        assert_eq!(strip_scheme("  abc ", ""), "abc");
    }

    #[test]
    fn test_issue_and_verify() {
        let token = issue_token(&json!({ "user": { "id": 1, "name": "bar" } }), "MySecret", DEFAULT_TOKEN_TTL)
            .unwrap();

        let claims = JwtVerifier::new()
            .verify(&format!("Bearer {}", token), "MySecret", "Bearer")
            .unwrap();

        assert_eq!(claims["user"]["name"], json!("bar"));
        assert!(claims.contains_key("exp"));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let token = issue_token(&json!({}), "MySecret", DEFAULT_TOKEN_TTL).unwrap();
        let err = JwtVerifier::new().verify(&token, "OtherSecret", "Bearer").unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn test_verify_expired() {
        let mut claims = ClaimSet::new();
        let past = chrono::Utc::now().timestamp() - 3_600;
        claims.insert("exp".to_string(), json!(past));
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"MySecret")).unwrap();

        let err = JwtVerifier::new().verify(&token, "MySecret", "JWT").unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn test_verify_malformed_and_missing() {
        let verifier = JwtVerifier::new();
        assert!(matches!(verifier.verify("Bearer not-a-token", "s", "Bearer"), Err(TokenError::Malformed(_))));
        assert_eq!(verifier.verify("Bearer ", "s", "Bearer"), Err(TokenError::Missing));
    }

    #[test]
    fn test_verify_without_exp() {
        let claims = json!({ "user": { "id": 1, "name": "bar" } });
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"MySecret")).unwrap();

        let verified = JwtVerifier::new()
            .verify(&format!("Bearer {}", token), "MySecret", "Bearer")
            .unwrap();
        assert_eq!(verified["user"]["id"], json!(1));
        assert!(!verified.contains_key("exp"));

        let err = JwtVerifier::new().verify(&token, "OtherSecret", "Bearer").unwrap_err();
        assert_eq!(err, TokenError::InvalidSignature);
    }

    #[test]
    fn test_verify_with_leeway() {
        let mut claims = ClaimSet::new();
        let recent = chrono::Utc::now().timestamp() - 30;
        claims.insert("exp".to_string(), json!(recent));
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"MySecret")).unwrap();

        assert_eq!(JwtVerifier::new().verify(&token, "MySecret", "JWT"), Err(TokenError::Expired));
        assert!(JwtVerifier::new().with_leeway(120).verify(&token, "MySecret", "JWT").is_ok());
    }

    #[test]
    fn test_verify_with_algorithm() {
        let claims = json!({ "user": { "id": 1, "name": "bar" } });
        let token = encode(&Header::new(Algorithm::HS384), &claims, &EncodingKey::from_secret(b"MySecret")).unwrap();

        let verifier = JwtVerifier::new().with_algorithm(Algorithm::HS384);
        assert!(verifier.verify(&token, "MySecret", "Bearer").is_ok());

        // HS256 verifier refuses an HS384 header
        assert!(matches!(JwtVerifier::new().verify(&token, "MySecret", "Bearer"), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_issue_rejects_out_of_range_ttl() {
        let err = issue_token(&json!({}), "s", Duration::from_secs(u64::MAX)).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));

        let err = issue_token(&json!({}), "s", Duration::from_secs(i64::MAX as u64)).unwrap_err();
        assert!(matches!(err, TokenError::Signing(_)));
    }

    #[test]
    fn test_issue_rejects_non_object() {
        assert!(matches!(issue_token(&json!([1, 2]), "s", DEFAULT_TOKEN_TTL), Err(TokenError::Signing(_))));
    }
}
