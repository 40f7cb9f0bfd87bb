//! Owned-resource matching against claim-set grants
//!
//! Identifiers arrive from request paths as strings and from tokens as either
//! strings or numbers, so neither matcher compares raw JSON values.

use serde_json::Value;
use std::borrow::Cow;

use crate::types::ResourceGrant;

/// Typed grant match: same type and numerically-coerced equal `fkey`
pub fn check_specific(resource_type: &str, target_id: &Value, grants: &[ResourceGrant]) -> bool {
    grants.iter().any(|grant| {
        grant.grant_type.as_deref() == Some(resource_type)
            && grant.fkey.as_ref().map_or(false, |fkey| coercive_eq(fkey, target_id))
    })
}

/// Resource-keyed grant match: `id` equal in canonical textual form
pub fn check_dynamic(target_id: &Value, grants: &[ResourceGrant]) -> bool {
    grants
        .iter()
        .any(|grant| grant.id.as_ref().map_or(false, |id| textual_eq(id, target_id)))
}

/// Canonical text of a scalar identifier; objects, arrays and null have none
fn textual(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        _ => None,
    }
}

/// Largest magnitude below which every integer is exact in an `f64`
const F64_EXACT_LIMIT: u128 = 1 << 53;

/// Exact integer form of a number or integer string
fn integral(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// `1 == "1"`, `"01" != 1`
pub fn textual_eq(a: &Value, b: &Value) -> bool {
    match (textual(a), textual(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// `1 == "1"`, `"01" == 1`, `"1.0" == 1`; falls back to textual equality for non-numeric ids
///
/// Integers compare exactly. Fractional forms compare as `f64` only against
/// integers an `f64` represents exactly.
pub fn coercive_eq(a: &Value, b: &Value) -> bool {
    if let (Some(a), Some(b)) = (integral(a), integral(b)) {
        return a == b;
    }

    let exact = |v: &Value| integral(v).map_or(true, |i| i.unsigned_abs() <= F64_EXACT_LIMIT);

    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x == y && exact(a) && exact(b),
        _ => textual_eq(a, b),
    }
}
