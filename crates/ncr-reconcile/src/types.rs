use crate::diagnostics::{Diagnostic, Severity};
use ncr_schemas::State;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the host must do with the resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// New state equals prior state.
    #[serde(rename = "no-op")]
    NoOp,
    /// There was no prior state: a fresh resource.
    #[serde(rename = "none-prior-exists")]
    Create,
    #[serde(rename = "update-in-place")]
    UpdateInPlace,
    /// At least one attribute change forces destroy + recreate.
    #[serde(rename = "replace")]
    Replace,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::NoOp => "no-op",
            Action::Create => "none-prior-exists",
            Action::UpdateInPlace => "update-in-place",
            Action::Replace => "replace",
        }
    }
}

/// Stages of one reconciliation call. `Failed` is entered from any stage
/// when a fatal diagnostic is raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    ValidatingSchema,
    ResolvingAttributes,
    ClassifyingAction,
    Done,
    Failed,
}

/// Successful reconciliation. Diagnostics here are never fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub new_state: State,
    pub action: Action,
    pub diagnostics: Vec<Diagnostic>,
}

/// Fatal reconciliation. Carries no state: the caller must treat the
/// resource as unchanged and retry after fixing the input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcileFailure {
    /// Stage that raised the fatal diagnostic.
    pub stage: Stage,
    /// Every diagnostic recorded up to and including the fatal one(s).
    pub diagnostics: Vec<Diagnostic>,
}

impl ReconcileFailure {
    pub fn fatal(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_fatal())
    }
}

impl fmt::Display for ReconcileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.fatal().count();
        write!(
            f,
            "reconciliation failed during {:?} with {n} fatal diagnostic(s)",
            self.stage
        )?;
        if let Some(first) = self.fatal().next() {
            write!(f, "; first: {first}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ReconcileFailure {}

/// Host-configurable knobs. Passed explicitly into every call; the engine
/// keeps no configuration of its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    /// Severity of ambiguous set identities. `Info` lets reconciliation
    /// continue, treating the ambiguous elements as new.
    pub ambiguous_identity: Severity,
    /// Emit an informational diagnostic whenever an optional computed field
    /// left unset by the caller gets a synthesized value.
    pub info_on_synthesized: bool,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            ambiguous_identity: Severity::Error,
            info_on_synthesized: true,
        }
    }
}

impl EnginePolicy {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn lenient_identity() -> Self {
        Self {
            ambiguous_identity: Severity::Info,
            ..Self::default()
        }
    }
}
