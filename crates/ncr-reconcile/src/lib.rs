//! ncr-reconcile
//!
//! Nested-collection reconciliation engine.
//!
//! Given a resource's prior state and desired configuration, decides:
//! - which attributes are carried forward from prior state and which are
//!   recomputed (per-attribute modifiers)
//! - whether the change applies in place or forces replacement
//! - how computed values of unordered-collection elements stay attached to
//!   the same logical element across reconciliations (identity keys)
//!
//! Deterministic, pure logic. No IO, no clock, no randomness, no shared
//! mutable state: independent resources can be reconciled in parallel.

pub mod collection;
mod diagnostics;
mod engine;
pub mod gate;
mod generate;
pub mod host;
pub mod identity;
pub mod modifier;
mod registry;
mod resolve;
mod types;

pub use collection::{reconcile_collection, CollectionOutcome};
pub use diagnostics::{Abort, Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use engine::{reconcile, reconcile_with_policy};
pub use gate::{check_apply_gate, ApplyGate};
pub use host::{handle_request, ReconcileRequest, ReconcileResponse};
pub use identity::{identify, identify_value, ElementHandle, IdentityKey};
pub use modifier::{resolve, Resolution};
pub use registry::{DuplicateResourceType, SchemaRegistry};
pub use types::*;
