//! Per-attribute modifier classification.
//!
//! Pure. `prior == None` is the "no prior state" sentinel (first
//! reconciliation), which is different from a prior state whose attribute is
//! Null. Nothing is ever replaced on first reconciliation.

use ncr_schemas::{ModifierKind, Value};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub value: Value,
    pub forces_replace: bool,
}

/// Derives the planned value of one attribute from its prior and configured
/// values.
pub fn resolve(modifier: ModifierKind, prior: Option<&Value>, configured: &Value) -> Resolution {
    let value = match (modifier, prior) {
        (ModifierKind::PreservePriorIfUnknown, Some(p)) if configured.is_unknown() => p.clone(),
        _ => configured.clone(),
    };
    Resolution {
        forces_replace: forces_replace(modifier, prior, &value),
        value,
    }
}

/// Replacement test on a planned value.
///
/// - `ForceReplace`: prior is known and differs.
/// - `ForceReplaceIfConfigured`: planned value is set, prior is not Unknown,
///   and they differ. Unlike `ForceReplace` this also fires on unset -> set.
pub fn forces_replace(modifier: ModifierKind, prior: Option<&Value>, planned: &Value) -> bool {
    let Some(prior) = prior else {
        return false;
    };
    match modifier {
        ModifierKind::None | ModifierKind::PreservePriorIfUnknown => false,
        ModifierKind::ForceReplace => prior.is_known() && prior != planned,
        ModifierKind::ForceReplaceIfConfigured => {
            !planned.is_null() && !prior.is_unknown() && prior != planned
        }
    }
}
