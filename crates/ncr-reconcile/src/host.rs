//! Host-facing request/response contract.
//!
//! Mirrors what an orchestration host sends and expects back: the host
//! persists `new_state`, surfaces diagnostics keyed by attribute path, and
//! never applies a response that carries a fatal diagnostic.

use crate::diagnostics::{Diagnostic, DiagnosticCode, Severity};
use crate::engine::reconcile_with_policy;
use crate::registry::SchemaRegistry;
use crate::types::{Action, EnginePolicy};
use ncr_schemas::codec::object_to_json;
use ncr_schemas::{AttributePath, Config, State};
use serde::{Serialize, Serializer};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileRequest {
    pub resource_type: String,
    /// `None` for a resource that was never reconciled.
    pub prior_state: Option<State>,
    pub desired_config: Config,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconcileResponse {
    /// Absent on fatal results.
    #[serde(serialize_with = "serialize_state")]
    pub new_state: Option<State>,
    /// Absent on fatal results.
    pub action: Option<Action>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ReconcileResponse {
    pub fn is_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }
}

fn serialize_state<S: Serializer>(state: &Option<State>, serializer: S) -> Result<S::Ok, S::Error> {
    match state {
        Some(s) => object_to_json(s).serialize(serializer),
        None => serializer.serialize_none(),
    }
}

/// Looks up the schema for the request's resource type and reconciles.
/// An unregistered resource type is a fatal schema violation.
pub fn handle_request(
    registry: &SchemaRegistry,
    policy: &EnginePolicy,
    request: &ReconcileRequest,
) -> ReconcileResponse {
    let Some(schema) = registry.get(&request.resource_type) else {
        return ReconcileResponse {
            new_state: None,
            action: None,
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                code: DiagnosticCode::SchemaViolation,
                message: format!("unknown resource type '{}'", request.resource_type),
                path: AttributePath::root(),
            }],
        };
    };

    match reconcile_with_policy(
        &request.resource_type,
        &schema,
        request.prior_state.as_ref(),
        &request.desired_config,
        policy,
    ) {
        Ok(result) => ReconcileResponse {
            new_state: Some(result.new_state),
            action: Some(result.action),
            diagnostics: result.diagnostics,
        },
        Err(failure) => ReconcileResponse {
            new_state: None,
            action: None,
            diagnostics: failure.diagnostics,
        },
    }
}
