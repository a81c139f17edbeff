//! ncr-schemas
//!
//! Value model, attribute schemas and attribute paths shared by the
//! reconciliation engine and its hosts. Pure data; the only IO-adjacent
//! piece is the JSON document codec.

pub mod codec;
mod path;
mod schema;
mod value;

pub use path::{AttributePath, PathStep};
pub use schema::{
    AttributeKind, AttributeSpec, GenerationRule, ModifierKind, NamedPredicate, Schema,
    SchemaError, Validator,
};
pub use value::{field, Config, Object, State, Value};
