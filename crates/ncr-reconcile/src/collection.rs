//! Schema-driven reconciliation of Set- and List-valued attributes.
//!
//! - List: positional pairing; output order is configured order.
//! - Set: pairing by identity key; output follows configured order too, but
//!   that order carries no meaning.
//! - Scalar elements: kept as configured, checked against the element
//!   validators; a scalar Set element is its own identity.
//!
//! Matched elements are resolved before fresh ones so generated values can
//! steer clear of everything the matched elements keep.

use crate::diagnostics::{Abort, DiagnosticCode, Diagnostics, Severity};
use crate::identity::{identify_value, match_elements, ElementHandle, IdentityKey};
use crate::resolve::{planned_input, resolve_object, Pass, Resolved, Scope};
use crate::types::{EnginePolicy, ReconcileFailure, Stage};
use ncr_schemas::{AttributeKind, AttributePath, AttributeSpec, Object, Schema, Value};
use std::collections::BTreeMap;
use tracing::trace;

/// Output of [`reconcile_collection`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub elements: Vec<Object>,
    pub forces_replace: bool,
    /// Non-fatal diagnostics only.
    pub diagnostics: Vec<crate::diagnostics::Diagnostic>,
}

/// Standalone entry point: reconciles bare element sequences against a
/// nested schema. Identity fields of a Set are the nested schema's required,
/// non-computed fields. Paths in diagnostics start at the element index
/// (`[1].port`).
pub fn reconcile_collection(
    kind: AttributeKind,
    nested: &Schema,
    prior_elements: &[Object],
    configured_elements: &[Object],
    policy: &EnginePolicy,
) -> Result<CollectionOutcome, ReconcileFailure> {
    let id_fields: Vec<&str> = nested
        .iter()
        .filter(|a| a.required && !a.computed)
        .map(|a| a.name.as_str())
        .collect();
    let prior: Vec<&Object> = prior_elements.iter().collect();
    let configured: Vec<&Object> = configured_elements.iter().collect();

    let mut pass = Pass::new("", policy);
    let outcome = reconcile_elements(
        &mut pass,
        kind,
        nested,
        &id_fields,
        &prior,
        &configured,
        &AttributePath::root(),
    );
    let diagnostics = pass.diags.into_vec();
    match outcome {
        Ok((elements, forces_replace)) => Ok(CollectionOutcome {
            elements,
            forces_replace,
            diagnostics,
        }),
        Err(Abort) => Err(ReconcileFailure {
            stage: Stage::ResolvingAttributes,
            diagnostics,
        }),
    }
}

/// Reconciles the configured elements of one collection attribute. Returns
/// the collection value and whether any element field forces replacement.
pub(crate) fn reconcile_attribute(
    pass: &mut Pass<'_>,
    spec: &AttributeSpec,
    prior: Option<&Value>,
    configured: &[Value],
    path: &AttributePath,
) -> Result<(Value, bool), Abort> {
    let Some(nested) = spec.nested() else {
        check_scalar_elements(pass, spec, configured, path)?;
        return Ok((collection_value(spec.kind, configured.to_vec()), false));
    };

    let prior_elements: Vec<&Object> = prior
        .and_then(Value::elements)
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default();

    let mut configured_elements: Vec<&Object> = Vec::with_capacity(configured.len());
    for (i, item) in configured.iter().enumerate() {
        match item.as_object() {
            Some(o) => configured_elements.push(o),
            None => {
                return Err(pass.diags.raise(
                    DiagnosticCode::SchemaViolation,
                    &path.index(i),
                    format!("expected an object element, got {}", item.type_name()),
                ));
            }
        }
    }

    let id_fields = spec.identity_fields();
    let (elements, forces_replace) = reconcile_elements(
        pass,
        spec.kind,
        nested,
        &id_fields,
        &prior_elements,
        &configured_elements,
        path,
    )?;
    let elements = elements.into_iter().map(Value::Object).collect();
    Ok((collection_value(spec.kind, elements), forces_replace))
}

fn check_scalar_elements(
    pass: &mut Pass<'_>,
    spec: &AttributeSpec,
    configured: &[Value],
    path: &AttributePath,
) -> Result<(), Abort> {
    if spec.kind == AttributeKind::Set {
        let keys: Vec<IdentityKey> = configured.iter().map(identify_value).collect();
        let mut groups: BTreeMap<&IdentityKey, Vec<usize>> = BTreeMap::new();
        for (i, k) in keys.iter().enumerate() {
            groups.entry(k).or_default().push(i);
        }
        let mut collisions: Vec<Vec<usize>> =
            groups.into_values().filter(|g| g.len() > 1).collect();
        collisions.sort();
        if !collisions.is_empty() {
            let severity = pass.policy.ambiguous_identity;
            report_collisions(&mut pass.diags, severity, &keys, &collisions, path)?;
        }
    }

    for (i, item) in configured.iter().enumerate() {
        for validator in &spec.element_validators {
            if let Err(reason) = validator.check(item) {
                return Err(pass.diags.raise(
                    DiagnosticCode::ValidationFailure,
                    &path.index(i),
                    reason,
                ));
            }
        }
    }
    Ok(())
}

fn collection_value(kind: AttributeKind, elements: Vec<Value>) -> Value {
    match kind {
        AttributeKind::Set => Value::Set(elements),
        AttributeKind::List | AttributeKind::Scalar => Value::List(elements),
    }
}

/// Element with schema defaults filled in, so identity keys see the same
/// values the resolved element will carry.
fn with_defaults(nested: &Schema, element: &Object) -> Object {
    let mut out = element.clone();
    for spec in nested.iter() {
        if spec.default.is_some() {
            let planned = planned_input(spec, ncr_schemas::field(element, &spec.name));
            out.insert(spec.name.clone(), planned);
        }
    }
    out
}

pub(crate) fn reconcile_elements(
    pass: &mut Pass<'_>,
    kind: AttributeKind,
    nested: &Schema,
    id_fields: &[&str],
    prior: &[&Object],
    configured: &[&Object],
    path: &AttributePath,
) -> Result<(Vec<Object>, bool), Abort> {
    let handles: Vec<ElementHandle> = configured
        .iter()
        .map(|c| ElementHandle::new(with_defaults(nested, c), id_fields))
        .collect();

    let pairs: Vec<Option<usize>> = match kind {
        AttributeKind::Set => match_set(pass, id_fields, prior, &handles, path)?,
        AttributeKind::List | AttributeKind::Scalar => (0..configured.len())
            .map(|i| (i < prior.len()).then_some(i))
            .collect(),
    };

    // Values matched elements already hold, per field.
    let mut taken: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for &p in pairs.iter().flatten() {
        for (name, v) in prior[p] {
            if v.is_known() {
                taken.entry(name.clone()).or_default().push(v.clone());
            }
        }
    }

    let matched = (0..configured.len()).filter(|&i| pairs[i].is_some());
    let fresh = (0..configured.len()).filter(|&i| pairs[i].is_none());
    let order: Vec<usize> = matched.chain(fresh).collect();

    let mut slots: Vec<Option<Object>> = vec![None; configured.len()];
    let mut forces_replace = false;
    for i in order {
        let scope = Scope {
            key: &handles[i].identity,
            seq: i,
            taken: &taken,
        };
        let Resolved {
            object,
            forces_replace: replace,
        } = resolve_object(
            pass,
            nested,
            pairs[i].map(|p| prior[p]),
            configured[i],
            &path.index(i),
            &scope,
        )?;
        forces_replace |= replace;
        for (name, v) in &object {
            if v.is_known() {
                taken.entry(name.clone()).or_default().push(v.clone());
            }
        }
        slots[i] = Some(object);
    }

    trace!(
        path = %path,
        configured = configured.len(),
        prior = prior.len(),
        matched = pairs.iter().filter(|p| p.is_some()).count(),
        "collection reconciled"
    );

    Ok((slots.into_iter().flatten().collect(), forces_replace))
}

fn match_set(
    pass: &mut Pass<'_>,
    id_fields: &[&str],
    prior: &[&Object],
    configured: &[ElementHandle],
    path: &AttributePath,
) -> Result<Vec<Option<usize>>, Abort> {
    if configured.is_empty() {
        return Ok(Vec::new());
    }

    let severity = pass.policy.ambiguous_identity;
    if id_fields.is_empty() {
        pass.diags.report(
            severity,
            DiagnosticCode::AmbiguousIdentity,
            path,
            "set elements have no identity fields; elements cannot be matched across reconciliations",
        )?;
        return Ok(vec![None; configured.len()]);
    }

    for (i, h) in configured.iter().enumerate() {
        for (name, v) in id_fields.iter().zip(h.identity.values()) {
            if !v.is_known() {
                return Err(pass.diags.raise(
                    DiagnosticCode::GenerationFailure,
                    &path.index(i).child(*name),
                    format!("identity field '{name}' has no value and no default"),
                ));
            }
        }
    }

    let prior_handles: Vec<ElementHandle> = prior
        .iter()
        .map(|p| ElementHandle::new((*p).clone(), id_fields))
        .collect();
    let plan = match_elements(&prior_handles, configured);
    trace!(path = %path, dropped = ?plan.dropped(prior.len()), "set elements matched");

    if plan.is_ambiguous() {
        let keys: Vec<IdentityKey> = configured.iter().map(|h| h.identity.clone()).collect();
        report_collisions(&mut pass.diags, severity, &keys, &plan.collisions, path)?;
    }

    Ok(plan.pairs)
}

fn report_collisions(
    diags: &mut Diagnostics,
    severity: Severity,
    keys: &[IdentityKey],
    collisions: &[Vec<usize>],
    path: &AttributePath,
) -> Result<(), Abort> {
    let mut fatal = false;
    for group in collisions {
        let at = group
            .iter()
            .map(|i| format!("{}", path.index(*i)))
            .collect::<Vec<_>>()
            .join(", ");
        let key = keys[group[0]].render();
        for &i in group {
            let r = diags.report(
                severity,
                DiagnosticCode::AmbiguousIdentity,
                &path.index(i),
                format!("identity key '{key}' is shared by elements {at}"),
            );
            fatal |= r.is_err();
        }
    }
    if fatal {
        Err(Abort)
    } else {
        Ok(())
    }
}
