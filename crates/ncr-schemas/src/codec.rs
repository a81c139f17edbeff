//! Schema-directed conversion between host JSON documents and [`Value`].
//!
//! - JSON arrays become `Set` or `List` according to the attribute kind
//!   (arrays under attributes the schema does not know become `List`).
//! - `{"$unknown": true}` is the Unknown placeholder; `null` is Null.
//! - Attributes absent from the schema are still decoded so the engine can
//!   report them as schema violations.

use crate::schema::{AttributeKind, AttributeSpec, Schema};
use crate::value::{Object, Value};
use anyhow::{bail, Result};
use serde_json::{Map, Value as Json};

pub const UNKNOWN_MARKER: &str = "$unknown";

fn is_unknown_marker(map: &Map<String, Json>) -> bool {
    map.len() == 1 && map.get(UNKNOWN_MARKER).and_then(Json::as_bool) == Some(true)
}

/// Decodes a JSON object into an attribute mapping using `schema` for shapes.
pub fn object_from_json(schema: Option<&Schema>, json: &Json) -> Result<Object> {
    let Json::Object(map) = json else {
        bail!("expected a JSON object, got {}", json_kind(json));
    };
    let mut out = Object::new();
    for (name, v) in map {
        let spec = schema.and_then(|s| s.get(name));
        out.insert(name.clone(), value_from_json(spec, v)?);
    }
    Ok(out)
}

/// Decodes one attribute value. `spec` is `None` for attributes the schema
/// does not declare.
pub fn value_from_json(spec: Option<&AttributeSpec>, json: &Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::String(s) => Value::String(s.clone()),
        Json::Number(n) => bail!(
            "numeric value {n} is not supported{}; quote it as a string",
            spec.map(|s| format!(" for attribute '{}'", s.name))
                .unwrap_or_default()
        ),
        Json::Object(map) if is_unknown_marker(map) => Value::Unknown,
        Json::Object(_) => {
            let nested = spec.and_then(AttributeSpec::nested);
            Value::Object(object_from_json(nested, json)?)
        }
        Json::Array(items) => {
            let nested = spec.and_then(AttributeSpec::nested);
            let mut elements = Vec::with_capacity(items.len());
            for item in items {
                elements.push(element_from_json(nested, item)?);
            }
            match spec.map(|s| s.kind) {
                Some(AttributeKind::Set) => Value::Set(elements),
                _ => Value::List(elements),
            }
        }
    })
}

fn element_from_json(nested: Option<&Schema>, json: &Json) -> Result<Value> {
    match json {
        Json::Object(map) if !is_unknown_marker(map) => {
            Ok(Value::Object(object_from_json(nested, json)?))
        }
        other => value_from_json(None, other),
    }
}

pub fn to_json(v: &Value) -> Json {
    match v {
        Value::Null => Json::Null,
        Value::Unknown => {
            let mut m = Map::new();
            m.insert(UNKNOWN_MARKER.to_string(), Json::Bool(true));
            Json::Object(m)
        }
        Value::String(s) => Json::String(s.clone()),
        Value::Bool(b) => Json::Bool(*b),
        Value::List(items) | Value::Set(items) => Json::Array(items.iter().map(to_json).collect()),
        Value::Object(map) => object_to_json(map),
    }
}

pub fn object_to_json(map: &Object) -> Json {
    Json::Object(map.iter().map(|(k, v)| (k.clone(), to_json(v))).collect())
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
