use crate::diagnostics::{Abort, DiagnosticCode};
use crate::identity::IdentityKey;
use crate::resolve::{resolve_object, Pass, Scope};
use crate::types::{Action, EnginePolicy, ReconcileFailure, ReconciliationResult, Stage};
use ncr_schemas::{field, AttributeKind, AttributePath, Config, Object, Schema, State, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Reconciles one resource under the strict default policy.
///
/// `prior == None` means the resource has never been reconciled.
pub fn reconcile(
    schema: &Schema,
    prior: Option<&State>,
    config: &Config,
) -> Result<ReconciliationResult, ReconcileFailure> {
    reconcile_with_policy("", schema, prior, config, &EnginePolicy::default())
}

/// Deterministic reconciliation:
/// - unknown or missing-required config attributes => fatal, nothing resolved
/// - attributes resolved in declaration order; any replace signal is OR-ed
/// - no prior => Create; unchanged => NoOp; replace signal => Replace;
///   otherwise UpdateInPlace
///
/// `resource_type` seeds generated identifiers.
pub fn reconcile_with_policy(
    resource_type: &str,
    schema: &Schema,
    prior: Option<&State>,
    config: &Config,
    policy: &EnginePolicy,
) -> Result<ReconciliationResult, ReconcileFailure> {
    let mut pass = Pass::new(resource_type, policy);
    let mut stage = Stage::Start;
    let outcome = run(&mut pass, &mut stage, schema, prior, config);
    let diagnostics = pass.diags.into_vec();

    match outcome {
        Ok((new_state, action)) => {
            debug!(
                resource_type,
                action = action.as_str(),
                diagnostics = diagnostics.len(),
                "reconciled"
            );
            Ok(ReconciliationResult {
                new_state,
                action,
                diagnostics,
            })
        }
        Err(Abort) => {
            warn!(
                resource_type,
                stage = ?stage,
                diagnostics = diagnostics.len(),
                "reconciliation failed"
            );
            Err(ReconcileFailure { stage, diagnostics })
        }
    }
}

fn run(
    pass: &mut Pass<'_>,
    stage: &mut Stage,
    schema: &Schema,
    prior: Option<&State>,
    config: &Config,
) -> Result<(State, Action), Abort> {
    *stage = Stage::ValidatingSchema;
    trace!(stage = ?stage);
    validate_object(pass, schema, config, &AttributePath::root())?;

    *stage = Stage::ResolvingAttributes;
    trace!(stage = ?stage);
    let key = IdentityKey::empty();
    let taken = BTreeMap::new();
    let scope = Scope {
        key: &key,
        seq: 0,
        taken: &taken,
    };
    let resolved = resolve_object(pass, schema, prior, config, &AttributePath::root(), &scope)?;

    *stage = Stage::ClassifyingAction;
    trace!(stage = ?stage, forces_replace = resolved.forces_replace);
    let action = match prior {
        None => Action::Create,
        Some(p) if equivalent(p, &resolved.object) => Action::NoOp,
        Some(_) if resolved.forces_replace => Action::Replace,
        Some(_) => Action::UpdateInPlace,
    };

    *stage = Stage::Done;
    Ok((resolved.object, action))
}

/// Checks config shape against the schema, recursing into collection
/// elements. The first violation aborts.
fn validate_object(
    pass: &mut Pass<'_>,
    schema: &Schema,
    config: &Object,
    path: &AttributePath,
) -> Result<(), Abort> {
    if let Some(name) = config.keys().find(|k| !schema.contains(k)) {
        return Err(pass.diags.raise(
            DiagnosticCode::SchemaViolation,
            &path.child(name),
            format!("unsupported attribute '{name}'"),
        ));
    }

    for spec in schema.iter() {
        let p = path.child(&spec.name);
        let v = field(config, &spec.name);

        if spec.required && v.is_null() && spec.default.is_none() {
            return Err(pass.diags.raise(
                DiagnosticCode::SchemaViolation,
                &p,
                format!("required attribute '{}' is missing", spec.name),
            ));
        }

        match (spec.kind, v) {
            (_, Value::Null | Value::Unknown) => {}
            (AttributeKind::Scalar, Value::String(_) | Value::Bool(_)) => {}
            (AttributeKind::Set | AttributeKind::List, Value::Set(items) | Value::List(items)) => {
                let nested = spec.nested();
                for (i, item) in items.iter().enumerate() {
                    let ep = p.index(i);
                    match (nested, item) {
                        (Some(nested), Value::Object(o)) => validate_object(pass, nested, o, &ep)?,
                        (None, Value::String(_) | Value::Bool(_)) => {}
                        (_, Value::Unknown) => {
                            return Err(pass.diags.raise(
                                DiagnosticCode::GenerationFailure,
                                &ep,
                                "element depends on an unresolved upstream value",
                            ));
                        }
                        (_, other) => {
                            let expected = if nested.is_some() { "an object" } else { "a scalar" };
                            return Err(pass.diags.raise(
                                DiagnosticCode::SchemaViolation,
                                &ep,
                                format!("expected {expected} element, got {}", other.type_name()),
                            ));
                        }
                    }
                }
            }
            (kind, other) => {
                let expected = match kind {
                    AttributeKind::Scalar => "a scalar",
                    AttributeKind::Set => "a set",
                    AttributeKind::List => "a list",
                };
                return Err(pass.diags.raise(
                    DiagnosticCode::SchemaViolation,
                    &p,
                    format!("expected {expected}, got {}", other.type_name()),
                ));
            }
        }
    }
    Ok(())
}

/// Drops Null fields recursively so "absent" and "explicitly Null" compare equal.
fn normalized(v: &Value) -> Value {
    match v {
        Value::Object(map) => Value::Object(normalized_object(map)),
        Value::List(items) => Value::List(items.iter().map(normalized).collect()),
        Value::Set(items) => Value::Set(items.iter().map(normalized).collect()),
        other => other.clone(),
    }
}

fn normalized_object(map: &Object) -> Object {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), normalized(v)))
        .collect()
}

fn equivalent(a: &State, b: &State) -> bool {
    normalized_object(a) == normalized_object(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_ignores_null_fields() {
        let mut a = State::new();
        a.insert("name".into(), Value::string("r1"));
        let mut b = a.clone();
        b.insert("description".into(), Value::Null);
        assert!(equivalent(&a, &b));
    }
}
