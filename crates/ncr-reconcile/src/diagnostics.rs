//! Diagnostics aggregation.
//!
//! Findings are data, not panics. Every stage appends to one [`Diagnostics`]
//! list; a fatal finding is appended and then propagated as [`Abort`] with
//! `?`, so nothing after the point of detection runs.

use ncr_schemas::AttributePath;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Config names an attribute the schema lacks, omits a required one, or
    /// has the wrong shape.
    SchemaViolation,
    /// Two configured set elements share an identity key, or a set has no
    /// identity fields at all.
    AmbiguousIdentity,
    /// A value could not be produced (unresolved upstream field, missing
    /// identity field, unusable generation rule).
    GenerationFailure,
    /// A resolved value failed one of its attribute validators.
    ValidationFailure,
    Informational,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::SchemaViolation => "schema_violation",
            DiagnosticCode::AmbiguousIdentity => "ambiguous_identity",
            DiagnosticCode::GenerationFailure => "generation_failure",
            DiagnosticCode::ValidationFailure => "validation_failure",
            DiagnosticCode::Informational => "informational",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    pub path: AttributePath,
}

impl Diagnostic {
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Info => "info",
            Severity::Error => "error",
        };
        if self.path.is_root() {
            write!(f, "{sev}[{}]: {}", self.code.as_str(), self.message)
        } else {
            write!(
                f,
                "{sev}[{}] {}: {}",
                self.code.as_str(),
                self.path,
                self.message
            )
        }
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Diagnostic", 5)?;
        s.serialize_field("severity", &self.severity)?;
        s.serialize_field("code", &self.code)?;
        s.serialize_field("message", &self.message)?;
        s.serialize_field("attribute_path", &self.path)?;
        s.serialize_field("attribute_segments", &self.path.segments())?;
        s.end()
    }
}

/// Marker for "a fatal diagnostic was recorded; stop now".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Abort;

/// Append-only diagnostics list threaded through one reconciliation.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finding with an explicit severity. Returns `Err(Abort)` when
    /// the finding is fatal.
    pub fn report(
        &mut self,
        severity: Severity,
        code: DiagnosticCode,
        path: &AttributePath,
        message: impl Into<String>,
    ) -> Result<(), Abort> {
        self.items.push(Diagnostic {
            severity,
            code,
            message: message.into(),
            path: path.clone(),
        });
        match severity {
            Severity::Error => Err(Abort),
            Severity::Info => Ok(()),
        }
    }

    /// Fail-fast surface: records a fatal finding and hands back the marker
    /// to return.
    pub fn raise(
        &mut self,
        code: DiagnosticCode,
        path: &AttributePath,
        message: impl Into<String>,
    ) -> Abort {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            code,
            message: message.into(),
            path: path.clone(),
        });
        Abort
    }

    /// Fail-soft surface: records an advisory notice.
    pub fn note(&mut self, path: &AttributePath, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Info,
            code: DiagnosticCode::Informational,
            message: message.into(),
            path: path.clone(),
        });
    }

    /// Position the next finding will take; pass it to the `*_at` variants to
    /// record a finding in an earlier position.
    pub fn mark(&self) -> usize {
        self.items.len()
    }

    /// [`Diagnostics::note`] recorded at position `at`.
    pub fn note_at(&mut self, at: usize, path: &AttributePath, message: impl Into<String>) {
        self.items.insert(
            at.min(self.items.len()),
            Diagnostic {
                severity: Severity::Info,
                code: DiagnosticCode::Informational,
                message: message.into(),
                path: path.clone(),
            },
        );
    }

    /// [`Diagnostics::raise`] recorded at position `at`.
    pub fn raise_at(
        &mut self,
        at: usize,
        code: DiagnosticCode,
        path: &AttributePath,
        message: impl Into<String>,
    ) -> Abort {
        self.items.insert(
            at.min(self.items.len()),
            Diagnostic {
                severity: Severity::Error,
                code,
                message: message.into(),
                path: path.clone(),
            },
        );
        Abort
    }

    pub fn has_fatal(&self) -> bool {
        self.items.iter().any(Diagnostic::is_fatal)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
