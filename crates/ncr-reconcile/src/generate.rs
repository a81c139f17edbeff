//! Value generation for computed fields.
//!
//! Deterministic: a generated value depends only on the rule, the resource
//! type, the attribute's schema path, the element's identity key and the
//! pass-local sequence number. No clock, no randomness.

use crate::identity::IdentityKey;
use ncr_schemas::{AttributeKind, GenerationRule, Object, Value};
use uuid::Uuid;

/// Upper bound on sequence bumps when skipping values already taken by
/// sibling elements.
const MAX_SEQ_BUMPS: usize = 4096;

pub(crate) struct GenerationInput<'a> {
    pub resource_type: &'a str,
    /// Attribute names from the root, indices stripped (`set_nested.port`).
    pub schema_path: &'a str,
    pub key: &'a IdentityKey,
    pub seq: usize,
    /// Fields of the element resolved so far.
    pub siblings: &'a Object,
    /// Values this field already holds in sibling elements of the same pass.
    pub taken: &'a [Value],
}

/// Produces a value or a reason it cannot.
pub(crate) fn generate(
    kind: AttributeKind,
    rule: Option<&GenerationRule>,
    input: &GenerationInput<'_>,
) -> Result<Value, String> {
    if kind.is_collection() {
        return match rule {
            None => Ok(match kind {
                AttributeKind::Set => Value::Set(Vec::new()),
                _ => Value::List(Vec::new()),
            }),
            Some(GenerationRule::Static(v)) => Ok(v.clone()),
            Some(_) => Err("only static generation rules can produce a collection".to_string()),
        };
    }

    match rule.unwrap_or(&GenerationRule::Uuid) {
        GenerationRule::Static(v) => Ok(v.clone()),
        GenerationRule::CopyOf(source) => {
            let v = input.siblings.get(source).unwrap_or(&Value::Null);
            if v.is_unknown() || v.contains_unknown() {
                Err(format!("depends on unresolved field '{source}'"))
            } else {
                Ok(v.clone())
            }
        }
        GenerationRule::Template(template) => {
            first_free(input, |seq| Value::String(render_template(template, input.key, seq)))
        }
        GenerationRule::Uuid => first_free(input, |seq| {
            let seed = format!(
                "{}:{}:{}:{}",
                input.resource_type,
                input.schema_path,
                input.key.canonical(),
                seq
            );
            Value::String(Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string())
        }),
    }
}

fn first_free(input: &GenerationInput<'_>, make: impl Fn(usize) -> Value) -> Result<Value, String> {
    for bump in 0..MAX_SEQ_BUMPS {
        let candidate = make(input.seq + bump);
        if !input.taken.contains(&candidate) {
            return Ok(candidate);
        }
        if bump == 0 && !template_varies(&make) {
            // Rule ignores the sequence number; collisions are the schema author's call.
            return Ok(candidate);
        }
    }
    Err(format!(
        "no free value within {MAX_SEQ_BUMPS} sequence numbers of {}",
        input.seq
    ))
}

fn template_varies(make: &impl Fn(usize) -> Value) -> bool {
    make(0) != make(1)
}

pub(crate) fn render_template(template: &str, key: &IdentityKey, seq: usize) -> String {
    template
        .replace("{seq}", &seq.to_string())
        .replace("{key}", &key.render())
}
