//! Attribute schema for a resource type.
//!
//! A [`Schema`] is built once per resource type at startup and never mutated.
//! Construction is the only place shape errors can surface. Collections hold
//! either objects ([`AttributeSpec::set`] / [`AttributeSpec::list`], which take
//! their nested schema by value) or plain scalars ([`AttributeSpec::scalar_set`]
//! / [`AttributeSpec::scalar_list`]); a scalar with an element shape cannot be
//! expressed.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Scalar,
    Set,
    List,
}

impl AttributeKind {
    pub fn is_collection(&self) -> bool {
        !matches!(self, AttributeKind::Scalar)
    }
}

/// Per-attribute rule governing how the planned value is derived and whether
/// a change forces replacement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    #[default]
    None,
    PreservePriorIfUnknown,
    ForceReplace,
    ForceReplaceIfConfigured,
}

/// How a computed field gets its value when nothing (config or prior state)
/// supplies one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationRule {
    /// Text with `{seq}` (pass-local sequence number) and `{key}` (rendered
    /// identity key) placeholders, e.g. `port_id_{seq}`.
    Template(String),
    /// Copy the resolved value of a sibling field.
    CopyOf(String),
    Static(Value),
    /// UUID v5 over resource type, attribute path, identity key and sequence.
    Uuid,
}

/// Opaque string predicate (e.g. a compiled pattern owned by the host).
#[derive(Clone)]
pub struct NamedPredicate {
    pub name: String,
    pub message: String,
    check: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl NamedPredicate {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            check: Arc::new(check),
        }
    }

    pub fn test(&self, s: &str) -> bool {
        (self.check)(s)
    }
}

impl fmt::Debug for NamedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedPredicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum Validator {
    /// Minimum string length in characters.
    LengthAtLeast(usize),
    /// Maximum string length in characters.
    LengthAtMost(usize),
    /// Inclusive bounds on the element count of a collection.
    SizeBetween { min: usize, max: usize },
    Predicate(NamedPredicate),
}

impl Validator {
    /// Checks a resolved value. Null and Unknown values are never rejected;
    /// presence is enforced separately by `required`.
    pub fn check(&self, v: &Value) -> Result<(), String> {
        match (self, v) {
            (Validator::LengthAtLeast(n), Value::String(s)) => {
                let len = s.chars().count();
                if len < *n {
                    return Err(format!("string length must be at least {n}, got {len}"));
                }
            }
            (Validator::LengthAtMost(n), Value::String(s)) => {
                let len = s.chars().count();
                if len > *n {
                    return Err(format!("string length must be at most {n}, got {len}"));
                }
            }
            (Validator::SizeBetween { min, max }, Value::List(items) | Value::Set(items)) => {
                if items.len() < *min || items.len() > *max {
                    return Err(format!(
                        "collection must contain between {min} and {max} elements, got {}",
                        items.len()
                    ));
                }
            }
            (Validator::Predicate(p), Value::String(s)) => {
                if !p.test(s) {
                    return Err(format!("{} ({})", p.message, p.name));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct AttributeSpec {
    pub name: String,
    pub kind: AttributeKind,
    pub required: bool,
    /// Caller may set it; only meaningful together with `computed`.
    pub optional: bool,
    pub computed: bool,
    pub modifier: ModifierKind,
    pub default: Option<Value>,
    pub generate: Option<GenerationRule>,
    pub validators: Vec<Validator>,
    /// Checked against every element of a scalar collection.
    pub element_validators: Vec<Validator>,
    identity_keys: Option<Vec<String>>,
    nested: Option<Schema>,
}

impl AttributeSpec {
    fn new(name: impl Into<String>, kind: AttributeKind, nested: Option<Schema>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            optional: false,
            computed: false,
            modifier: ModifierKind::None,
            default: None,
            generate: None,
            validators: Vec::new(),
            element_validators: Vec::new(),
            identity_keys: None,
            nested,
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Scalar, None)
    }

    pub fn set(name: impl Into<String>, nested: Schema) -> Self {
        Self::new(name, AttributeKind::Set, Some(nested))
    }

    pub fn list(name: impl Into<String>, nested: Schema) -> Self {
        Self::new(name, AttributeKind::List, Some(nested))
    }

    /// Set of strings/bools; an element is its own identity.
    pub fn scalar_set(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::Set, None)
    }

    pub fn scalar_list(name: impl Into<String>) -> Self {
        Self::new(name, AttributeKind::List, None)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn modifier(mut self, modifier: ModifierKind) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn default_value(mut self, v: impl Into<Value>) -> Self {
        self.default = Some(v.into());
        self
    }

    pub fn generate(mut self, rule: GenerationRule) -> Self {
        self.generate = Some(rule);
        self
    }

    pub fn validate(mut self, v: Validator) -> Self {
        self.validators.push(v);
        self
    }

    pub fn validate_elements(mut self, v: Validator) -> Self {
        self.element_validators.push(v);
        self
    }

    /// Overrides the derived identity fields of a Set attribute.
    pub fn identity_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn nested(&self) -> Option<&Schema> {
        self.nested.as_ref()
    }

    /// Collection whose elements are scalars rather than objects.
    pub fn has_scalar_elements(&self) -> bool {
        self.kind.is_collection() && self.nested.is_none()
    }

    /// Optional and computed: the caller may set it, otherwise the engine fills it.
    pub fn is_optional_computed(&self) -> bool {
        self.computed && self.optional
    }

    /// Fields used to match Set elements across reconciliations: the explicit
    /// override if given, otherwise the nested schema's required, non-computed
    /// fields in declaration order.
    pub fn identity_fields(&self) -> Vec<&str> {
        if let Some(keys) = &self.identity_keys {
            return keys.iter().map(String::as_str).collect();
        }
        match &self.nested {
            Some(nested) => nested
                .iter()
                .filter(|a| a.required && !a.computed)
                .map(|a| a.name.as_str())
                .collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    DuplicateAttribute(String),
    RequiredAndComputed(String),
    IdentityKeysOnNonSet(String),
    UnknownIdentityKey { attribute: String, key: String },
    GenerationOnNonComputed(String),
    CopyOfUnknownField { attribute: String, source: String },
    ElementValidatorsWithoutScalarElements(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::DuplicateAttribute(a) => write!(f, "duplicate attribute '{a}'"),
            SchemaError::RequiredAndComputed(a) => {
                write!(f, "attribute '{a}' cannot be both required and computed")
            }
            SchemaError::IdentityKeysOnNonSet(a) => {
                write!(f, "attribute '{a}' declares identity keys but is not a set")
            }
            SchemaError::UnknownIdentityKey { attribute, key } => write!(
                f,
                "identity key '{key}' of attribute '{attribute}' is not a nested field"
            ),
            SchemaError::GenerationOnNonComputed(a) => write!(
                f,
                "attribute '{a}' declares a generation rule but is not computed"
            ),
            SchemaError::CopyOfUnknownField { attribute, source } => write!(
                f,
                "attribute '{attribute}' copies unknown sibling field '{source}'"
            ),
            SchemaError::ElementValidatorsWithoutScalarElements(a) => write!(
                f,
                "attribute '{a}' declares element validators but is not a scalar collection"
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Ordered attribute name -> spec mapping.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    attrs: Vec<AttributeSpec>,
    index: BTreeMap<String, usize>,
}

impl Schema {
    pub fn new(attrs: Vec<AttributeSpec>) -> Result<Self, SchemaError> {
        let mut index = BTreeMap::new();
        for (i, a) in attrs.iter().enumerate() {
            if index.insert(a.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateAttribute(a.name.clone()));
            }
        }

        for a in &attrs {
            if a.required && a.computed {
                return Err(SchemaError::RequiredAndComputed(a.name.clone()));
            }
            if a.generate.is_some() && !a.computed {
                return Err(SchemaError::GenerationOnNonComputed(a.name.clone()));
            }
            if let Some(GenerationRule::CopyOf(source)) = &a.generate {
                if source == &a.name || !index.contains_key(source) {
                    return Err(SchemaError::CopyOfUnknownField {
                        attribute: a.name.clone(),
                        source: source.clone(),
                    });
                }
            }
            if !a.element_validators.is_empty() && !a.has_scalar_elements() {
                return Err(SchemaError::ElementValidatorsWithoutScalarElements(
                    a.name.clone(),
                ));
            }
            if let Some(keys) = &a.identity_keys {
                if a.kind != AttributeKind::Set {
                    return Err(SchemaError::IdentityKeysOnNonSet(a.name.clone()));
                }
                let nested = a.nested.as_ref();
                for k in keys {
                    if nested.and_then(|n| n.get(k)).is_none() {
                        return Err(SchemaError::UnknownIdentityKey {
                            attribute: a.name.clone(),
                            key: k.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self { attrs, index })
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSpec> {
        self.index.get(name).map(|&i| &self.attrs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Attributes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}
