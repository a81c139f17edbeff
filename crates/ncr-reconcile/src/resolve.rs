//! Field-by-field resolution of one object (the resource itself, or one
//! collection element).
//!
//! Attributes are resolved in declaration order: defaults, collection
//! recursion, modifier, reuse of a known prior value, generation, then the
//! attribute's validators. Diagnostics therefore accumulate in declaration
//! order and a fatal one stops everything declared after it.
//!
//! `CopyOf` fields are generated after every other field of the object so
//! they can see generated siblings. Their diagnostics are still recorded at
//! the field's declared position.

use crate::collection;
use crate::diagnostics::{Abort, DiagnosticCode, Diagnostics};
use crate::generate::{generate, GenerationInput};
use crate::identity::IdentityKey;
use crate::modifier;
use crate::types::EnginePolicy;
use ncr_schemas::{field, AttributePath, AttributeSpec, GenerationRule, Object, Schema, Value};
use std::collections::BTreeMap;
use tracing::trace;

/// Mutable context of one reconciliation call.
pub(crate) struct Pass<'a> {
    pub resource_type: &'a str,
    pub policy: &'a EnginePolicy,
    pub diags: Diagnostics,
}

impl<'a> Pass<'a> {
    pub fn new(resource_type: &'a str, policy: &'a EnginePolicy) -> Self {
        Self {
            resource_type,
            policy,
            diags: Diagnostics::new(),
        }
    }
}

/// Where the object sits, for generation.
pub(crate) struct Scope<'a> {
    pub key: &'a IdentityKey,
    pub seq: usize,
    /// Field name -> values held by sibling elements in this pass.
    pub taken: &'a BTreeMap<String, Vec<Value>>,
}

pub(crate) struct Resolved {
    pub object: Object,
    pub forces_replace: bool,
}

/// `CopyOf` field waiting for its siblings.
struct Deferred<'s> {
    spec: &'s AttributeSpec,
    path: AttributePath,
    caller_omitted: bool,
    /// Diagnostics position at the field's declaration.
    mark: usize,
}

/// Configured value after defaults; computed fields nobody set become Unknown.
pub(crate) fn planned_input(spec: &AttributeSpec, configured: &Value) -> Value {
    match (configured, &spec.default) {
        (Value::Null, Some(d)) => d.clone(),
        (Value::Null, None) if spec.computed => Value::Unknown,
        (v, _) => v.clone(),
    }
}

pub(crate) fn resolve_object(
    pass: &mut Pass<'_>,
    schema: &Schema,
    prior: Option<&Object>,
    configured: &Object,
    path: &AttributePath,
    scope: &Scope<'_>,
) -> Result<Resolved, Abort> {
    let mut out = Object::new();
    let mut forces_replace = false;
    let mut deferred: Vec<Deferred<'_>> = Vec::new();

    for spec in schema.iter() {
        let attr_path = path.child(&spec.name);
        let raw = field(configured, &spec.name);
        let prior_v = prior.map(|p| field(p, &spec.name));

        let mut planned = planned_input(spec, raw);
        if spec.kind.is_collection() {
            if let Some(items) = planned.elements() {
                let items = items.to_vec();
                let (v, replace) =
                    collection::reconcile_attribute(pass, spec, prior_v, &items, &attr_path)?;
                forces_replace |= replace;
                planned = v;
            }
        }

        let resolution = modifier::resolve(spec.modifier, prior_v, &planned);
        let value = match prior_v {
            _ if !resolution.value.is_unknown() => {
                if resolution.forces_replace {
                    trace!(path = %attr_path, "attribute forces replacement");
                }
                forces_replace |= resolution.forces_replace;
                resolution.value
            }
            Some(p) if spec.computed && p.is_known() => p.clone(),
            _ if spec.computed => {
                let caller_omitted = raw.is_null() || raw.is_unknown();
                if matches!(spec.generate, Some(GenerationRule::CopyOf(_))) {
                    out.insert(spec.name.clone(), Value::Unknown);
                    deferred.push(Deferred {
                        spec,
                        path: attr_path,
                        caller_omitted,
                        mark: pass.diags.mark(),
                    });
                    continue;
                }
                let value = generate_field(pass, spec, &attr_path, scope, &out)
                    .map_err(|reason| {
                        pass.diags
                            .raise(DiagnosticCode::GenerationFailure, &attr_path, reason)
                    })?;
                if caller_omitted && synthesized_note_wanted(pass, spec) {
                    pass.diags.note(&attr_path, synthesized_message(spec));
                }
                value
            }
            _ => {
                return Err(pass.diags.raise(
                    DiagnosticCode::GenerationFailure,
                    &attr_path,
                    format!(
                        "value of '{}' depends on an unresolved upstream field",
                        spec.name
                    ),
                ));
            }
        };

        if let Err(reason) = check_validators(spec, &value) {
            return Err(pass
                .diags
                .raise(DiagnosticCode::ValidationFailure, &attr_path, reason));
        }
        out.insert(spec.name.clone(), value);
    }

    // Each insertion shifts the marks of later deferred fields by one.
    let mut inserted = 0;
    for d in deferred {
        let at = d.mark + inserted;
        let value = match generate_field(pass, d.spec, &d.path, scope, &out) {
            Ok(v) => v,
            Err(reason) => {
                return Err(pass
                    .diags
                    .raise_at(at, DiagnosticCode::GenerationFailure, &d.path, reason));
            }
        };
        let noted = d.caller_omitted && synthesized_note_wanted(pass, d.spec);
        if noted {
            pass.diags.note_at(at, &d.path, synthesized_message(d.spec));
            inserted += 1;
        }
        if let Err(reason) = check_validators(d.spec, &value) {
            return Err(pass.diags.raise_at(
                at + usize::from(noted),
                DiagnosticCode::ValidationFailure,
                &d.path,
                reason,
            ));
        }
        out.insert(d.spec.name.clone(), value);
    }

    Ok(Resolved {
        object: out,
        forces_replace,
    })
}

fn synthesized_note_wanted(pass: &Pass<'_>, spec: &AttributeSpec) -> bool {
    spec.is_optional_computed() && pass.policy.info_on_synthesized
}

fn synthesized_message(spec: &AttributeSpec) -> String {
    format!("{} omitted, synthesizing default", spec.name)
}

fn check_validators(spec: &AttributeSpec, v: &Value) -> Result<(), String> {
    spec.validators.iter().try_for_each(|validator| validator.check(v))
}

/// Generates a computed field nothing supplied. `Err` carries the message of
/// the GenerationFailure to raise.
fn generate_field(
    pass: &Pass<'_>,
    spec: &AttributeSpec,
    path: &AttributePath,
    scope: &Scope<'_>,
    siblings: &Object,
) -> Result<Value, String> {
    let schema_path = path.schema_path();
    let taken = scope
        .taken
        .get(&spec.name)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let input = GenerationInput {
        resource_type: pass.resource_type,
        schema_path: &schema_path,
        key: scope.key,
        seq: scope.seq,
        siblings,
        taken,
    };
    let value = generate(spec.kind, spec.generate.as_ref(), &input)
        .map_err(|reason| format!("cannot generate '{}': {reason}", spec.name))?;
    trace!(path = %path, value = %value, "generated computed value");
    Ok(value)
}
