/// Kinds of YAML document the workspace reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// `resources:` schema definitions.
    Schemas,
    /// `engine:` policy knobs.
    Policy,
}

impl ConfigKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Schemas => "SCHEMAS",
            ConfigKind::Policy => "POLICY",
        }
    }
}

/// JSON-pointer prefixes actually read for each document kind.
///
/// Schema definitions are checked field-by-field by the schema loader
/// itself, so the whole `/resources` subtree counts as consumed here.
pub fn consumed_pointers(kind: ConfigKind) -> &'static [&'static str] {
    match kind {
        ConfigKind::Schemas => SCHEMAS,
        ConfigKind::Policy => POLICY,
    }
}

static SCHEMAS: &[&str] = &["/resources"];

static POLICY: &[&str] = &["/engine/ambiguous_identity", "/engine/info_on_synthesized"];
