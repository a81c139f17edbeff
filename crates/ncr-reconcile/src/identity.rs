//! Stable identity for elements of unordered collections.
//!
//! An element's identity is its value restricted to the identity fields.
//! Two elements with equal keys are "the same logical element" across a
//! reconciliation even if their computed fields differ.

use ncr_schemas::{field, Object, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct IdentityKey {
    values: Vec<Value>,
    canonical: String,
}

impl IdentityKey {
    /// Key of a top-level resource (no identity fields).
    pub fn empty() -> Self {
        Self {
            values: Vec::new(),
            canonical: String::new(),
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Human/template rendering: string values raw, joined with `/`.
    pub fn render(&self) -> String {
        self.values
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Canonical, order-insensitive-for-sets encoding used for comparisons.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for IdentityKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for IdentityKey {}

impl PartialOrd for IdentityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdentityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

/// An element paired with its identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementHandle {
    pub identity: IdentityKey,
    pub value: Object,
}

impl ElementHandle {
    pub fn new(value: Object, id_fields: &[&str]) -> Self {
        Self {
            identity: identify(&value, id_fields),
            value,
        }
    }
}

fn canonical(v: &Value) -> String {
    match v {
        Value::Null => "n".to_string(),
        Value::Unknown => "u".to_string(),
        Value::Bool(b) => format!("b{b}"),
        Value::String(s) => format!("s{}:{s}", s.len()),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(canonical).collect();
            format!("l[{}]", parts.join(","))
        }
        Value::Set(items) => {
            let mut parts: Vec<String> = items.iter().map(canonical).collect();
            parts.sort();
            format!("t[{}]", parts.join(","))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}:{k}={}", k.len(), canonical(v)))
                .collect();
            format!("o{{{}}}", parts.join(","))
        }
    }
}

/// Restricts `element` to `id_fields` (in the given order).
pub fn identify(element: &Object, id_fields: &[&str]) -> IdentityKey {
    let values: Vec<Value> = id_fields
        .iter()
        .map(|f| field(element, f).clone())
        .collect();
    let canonical = values.iter().map(canonical).collect::<Vec<_>>().join("|");
    IdentityKey { values, canonical }
}

/// Identity of a scalar collection element: the value itself.
pub fn identify_value(v: &Value) -> IdentityKey {
    IdentityKey {
        values: vec![v.clone()],
        canonical: canonical(v),
    }
}

/// Result of pairing configured set elements with prior ones.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchPlan {
    /// For each configured element, the index of its prior element, if any.
    pub pairs: Vec<Option<usize>>,
    /// Groups of configured indices sharing one identity key (each group has
    /// at least two members, in ascending order).
    pub collisions: Vec<Vec<usize>>,
}

impl MatchPlan {
    pub fn is_ambiguous(&self) -> bool {
        !self.collisions.is_empty()
    }

    /// Prior indices that no configured element claimed (removed elements).
    pub fn dropped(&self, prior_len: usize) -> Vec<usize> {
        (0..prior_len)
            .filter(|i| !self.pairs.contains(&Some(*i)))
            .collect()
    }
}

/// Matches configured elements to prior elements by identity key.
///
/// Prior elements are indexed first-wins. A configured key that collides
/// with an earlier configured element is recorded as a collision and left
/// unmatched; only the first occurrence may claim the prior element.
pub fn match_elements(prior: &[ElementHandle], configured: &[ElementHandle]) -> MatchPlan {
    let mut by_key: BTreeMap<&IdentityKey, usize> = BTreeMap::new();
    for (i, p) in prior.iter().enumerate() {
        by_key.entry(&p.identity).or_insert(i);
    }

    let mut seen: BTreeMap<&IdentityKey, Vec<usize>> = BTreeMap::new();
    let mut pairs = Vec::with_capacity(configured.len());
    for (i, c) in configured.iter().enumerate() {
        let group = seen.entry(&c.identity).or_default();
        group.push(i);
        if group.len() > 1 {
            pairs.push(None);
        } else {
            pairs.push(by_key.get(&c.identity).copied());
        }
    }

    let mut collisions: Vec<Vec<usize>> = seen.into_values().filter(|g| g.len() > 1).collect();
    collisions.sort();

    MatchPlan { pairs, collisions }
}
