use serde::{Serialize, Serializer};
use std::fmt;

/// One step of an [`AttributePath`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathStep {
    Attr(String),
    Index(usize),
}

/// Location of a value inside a resource, rendered in dotted/indexed
/// notation (`set_nested[2].fixed_ip`) so hosts can map diagnostics back to
/// user-facing configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttributePath {
    steps: Vec<PathStep>,
}

impl AttributePath {
    /// The resource itself.
    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn attr(name: impl Into<String>) -> Self {
        Self::root().child(name)
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Attr(name.into()));
        Self { steps }
    }

    pub fn index(&self, i: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep::Index(i));
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Attribute names only, indices dropped (`set_nested.fixed_ip`). Stable
    /// across element reordering.
    pub fn schema_path(&self) -> String {
        self.steps
            .iter()
            .filter_map(|s| match s {
                PathStep::Attr(name) => Some(name.as_str()),
                PathStep::Index(_) => None,
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Path as an ordered sequence of strings (`["set_nested", "2", "fixed_ip"]`).
    pub fn segments(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| match s {
                PathStep::Attr(name) => name.clone(),
                PathStep::Index(i) => i.to_string(),
            })
            .collect()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for step in &self.steps {
            match step {
                PathStep::Attr(name) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{name}")?;
                }
                PathStep::Index(i) => write!(f, "[{i}]")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl Serialize for AttributePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
