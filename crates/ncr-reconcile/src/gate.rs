//! Apply gate.
//!
//! The single decision point a host consults before persisting anything:
//!
//! - a fatal result is **never** applied, not even partially;
//! - a no-op result needs no write;
//! - everything else is applied with the accompanying (non-fatal)
//!   diagnostics surfaced to the user.
//!
//! Pure and deterministic, like the engine.

use crate::{Action, Diagnostic, ReconcileFailure, ReconciliationResult};
use ncr_schemas::State;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyGate<'a> {
    /// Persist `new_state`; for `Replace` the host destroys and recreates.
    Apply {
        new_state: &'a State,
        action: Action,
        diagnostics: &'a [Diagnostic],
    },
    /// Nothing changed; prior state stays as is.
    Skip { diagnostics: &'a [Diagnostic] },
    /// Fatal. Prior state stays as is; the caller must fix the input.
    Reject { diagnostics: &'a [Diagnostic] },
}

impl ApplyGate<'_> {
    pub fn is_apply(&self) -> bool {
        matches!(self, ApplyGate::Apply { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ApplyGate::Reject { .. })
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ApplyGate::Apply { diagnostics, .. }
            | ApplyGate::Skip { diagnostics }
            | ApplyGate::Reject { diagnostics } => diagnostics,
        }
    }
}

pub fn check_apply_gate(
    outcome: &Result<ReconciliationResult, ReconcileFailure>,
) -> ApplyGate<'_> {
    match outcome {
        Err(failure) => ApplyGate::Reject {
            diagnostics: &failure.diagnostics,
        },
        Ok(result) if result.action == Action::NoOp => ApplyGate::Skip {
            diagnostics: &result.diagnostics,
        },
        Ok(result) => ApplyGate::Apply {
            new_state: &result.new_state,
            action: result.action,
            diagnostics: &result.diagnostics,
        },
    }
}
