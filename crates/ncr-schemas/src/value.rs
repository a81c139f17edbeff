use std::collections::BTreeMap;
use std::fmt;

/// Attribute mapping of an object value (and of whole states/configs).
pub type Object = BTreeMap<String, Value>;

/// Last successfully reconciled snapshot of a resource.
pub type State = Object;

/// Caller's desired snapshot of a resource.
pub type Config = Object;

/// Closed value model shared by states, configs and collection elements.
///
/// `Unknown` means "not yet computed, to be filled by reconciliation" and is
/// distinct from `Null` ("explicitly absent"). Modifiers branch on the
/// difference, so never collapse one into the other.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Unknown,
    String(String),
    Bool(bool),
    List(Vec<Value>),
    /// Order-insignificant; equality is multiset equality.
    Set(Vec<Value>),
    Object(Object),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// Neither Null nor Unknown.
    pub fn is_known(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }

    /// `true` if this value or anything nested inside it is Unknown.
    pub fn contains_unknown(&self) -> bool {
        match self {
            Value::Unknown => true,
            Value::List(items) | Value::Set(items) => items.iter().any(Value::contains_unknown),
            Value::Object(map) => map.values().any(Value::contains_unknown),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Elements of a List or Set value.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items),
            _ => None,
        }
    }

    /// Field lookup on an object; missing fields read as Null.
    pub fn field(&self, name: &str) -> &Value {
        self.as_object()
            .and_then(|m| m.get(name))
            .unwrap_or(&Value::Null)
    }

    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unknown => "unknown",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Object(_) => "object",
        }
    }
}

/// Reads a field of a mapping; missing fields are Null.
pub fn field<'a>(map: &'a Object, name: &str) -> &'a Value {
    map.get(name).unwrap_or(&Value::Null)
}

fn multiset_eq(a: &[Value], b: &[Value]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for x in a {
        for (i, y) in b.iter().enumerate() {
            if !used[i] && x == y {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Unknown, Value::Unknown) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => multiset_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Unknown => write!(f, "(unknown)"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) | Value::Set(items) => {
                let (open, close) = if matches!(self, Value::Set(_)) {
                    ('{', '}')
                } else {
                    ('[', ']')
                };
                write!(f, "{open}")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "{close}")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_equality_ignores_order() {
        let a = Value::Set(vec!["x".into(), "y".into()]);
        let b = Value::Set(vec!["y".into(), "x".into()]);
        assert_eq!(a, b);
    }

    #[test]
    fn set_equality_respects_multiplicity() {
        let a = Value::Set(vec!["x".into(), "x".into()]);
        let b = Value::Set(vec!["x".into(), "y".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn list_equality_is_positional() {
        let a = Value::List(vec!["x".into(), "y".into()]);
        let b = Value::List(vec!["y".into(), "x".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn null_and_unknown_are_distinct() {
        assert_ne!(Value::Null, Value::Unknown);
        assert!(!Value::Null.is_known());
        assert!(!Value::Unknown.is_known());
    }

    #[test]
    fn contains_unknown_looks_inside_collections() {
        let v = Value::Set(vec![Value::object([("port", Value::Unknown)])]);
        assert!(v.contains_unknown());
    }
}
