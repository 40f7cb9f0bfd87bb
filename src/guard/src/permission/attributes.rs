//! Field-level projection of JSON documents by attribute globs
//!
//! `*` keeps every field, a plain name keeps that field, `!name` drops it.
//! Dotted names address nested objects (`meta.owner`).

use serde_json::{Map, Value};

/// Project `data` onto the fields `attributes` permits
///
/// Arrays are projected element-wise. An empty attribute list permits nothing.
pub fn filter_value(data: &Value, attributes: &[String]) -> Value {
    match data {
        Value::Array(items) => Value::Array(items.iter().map(|item| filter_value(item, attributes)).collect()),
        Value::Object(map) => Value::Object(filter_object(map, attributes)),
        scalar => {
            if attributes.is_empty() {
                Value::Null
            } else {
                scalar.clone()
            }
        }
    }
}

fn filter_object(map: &Map<String, Value>, attributes: &[String]) -> Map<String, Value> {
    let (excluded, included): (Vec<&String>, Vec<&String>) =
        attributes.iter().partition(|a| a.starts_with('!'));

    let mut out = if included.iter().any(|a| a.as_str() == "*") {
        map.clone()
    } else {
        let mut out = Map::new();
        for path in included {
            copy_path(map, &mut out, path);
        }
        out
    };

    for path in excluded {
        remove_path(&mut out, &path[1..]);
    }

    out
}

fn copy_path(src: &Map<String, Value>, dst: &mut Map<String, Value>, path: &str) {
    match path.split_once('.') {
        None => {
            if let Some(value) = src.get(path) {
                dst.insert(path.to_string(), value.clone());
            }
        }
        Some((head, rest)) => {
            if let Some(Value::Object(inner)) = src.get(head) {
                let entry = dst
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(target) = entry {
                    copy_path(inner, target, rest);
                }
            }
        }
    }
}

fn remove_path(map: &mut Map<String, Value>, path: &str) {
    match path.split_once('.') {
        None => {
            map.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Value::Object(inner)) = map.get_mut(head) {
                remove_path(inner, rest);
            }
        }
    }
}
