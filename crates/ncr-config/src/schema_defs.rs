//! YAML schema definitions.
//!
//! ```yaml
//! resources:
//!   example_router:
//!     attributes:
//!       - name: id
//!         computed: true
//!         modifier: preserve_prior_if_unknown
//!       - name: name
//!         required: true
//!         validators:
//!           - length_at_least: 1
//!           - length_at_most: 32
//!       - name: external_fixed_ips
//!         kind: set
//!         optional: true
//!         computed: true
//!         identity_keys: [subnet_id]
//!         attributes:
//!           - name: subnet_id
//!             optional: true
//!       - name: tags
//!         kind: set
//!         optional: true
//!         element_validators:
//!           - length_at_most: 255
//! ```
//!
//! An attribute that is neither `required` nor `computed` is optional. A
//! `set` or `list` without element `attributes` holds plain scalars.

use crate::LoadedConfig;
use anyhow::{bail, Context, Result};
use ncr_reconcile::SchemaRegistry;
use ncr_schemas::codec::value_from_json;
use ncr_schemas::{AttributeKind, AttributeSpec, GenerationRule, ModifierKind, Schema, Validator};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    #[serde(default)]
    resources: BTreeMap<String, ResourceDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResourceDef {
    attributes: Vec<AttributeDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDef {
    pub name: String,
    #[serde(default = "scalar_kind")]
    pub kind: AttributeKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
    #[serde(default)]
    pub modifier: ModifierKind,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub generate: Option<GenerateDef>,
    #[serde(default)]
    pub identity_keys: Option<Vec<String>>,
    #[serde(default)]
    pub validators: Vec<ValidatorDef>,
    /// Checked against each element of a scalar `set` or `list`.
    #[serde(default)]
    pub element_validators: Vec<ValidatorDef>,
    /// Element attributes of a `set` or `list`.
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

fn scalar_kind() -> AttributeKind {
    AttributeKind::Scalar
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateDef {
    Template(String),
    CopyOf(String),
    Static(serde_json::Value),
    Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorDef {
    LengthAtLeast(usize),
    LengthAtMost(usize),
    SizeBetween { min: usize, max: usize },
}

/// Builds a schema from attribute definitions, recursing into collection
/// element attributes.
pub fn schema_from_attributes(defs: &[AttributeDef]) -> Result<Schema> {
    let mut specs = Vec::with_capacity(defs.len());
    for def in defs {
        specs.push(attribute_spec(def).with_context(|| format!("attribute '{}'", def.name))?);
    }
    Ok(Schema::new(specs)?)
}

fn attribute_spec(def: &AttributeDef) -> Result<AttributeSpec> {
    if def.required && def.optional {
        bail!("cannot be both required and optional");
    }

    let mut spec = match def.kind {
        AttributeKind::Scalar => {
            if !def.attributes.is_empty() {
                bail!("scalar attributes cannot declare element attributes");
            }
            AttributeSpec::scalar(&def.name)
        }
        AttributeKind::Set if def.attributes.is_empty() => AttributeSpec::scalar_set(&def.name),
        AttributeKind::List if def.attributes.is_empty() => AttributeSpec::scalar_list(&def.name),
        AttributeKind::Set | AttributeKind::List => {
            let nested = schema_from_attributes(&def.attributes)?;
            if def.kind == AttributeKind::Set {
                AttributeSpec::set(&def.name, nested)
            } else {
                AttributeSpec::list(&def.name, nested)
            }
        }
    };

    if def.required {
        spec = spec.required();
    } else if def.optional || !def.computed {
        spec = spec.optional();
    }
    if def.computed {
        spec = spec.computed();
    }
    spec = spec.modifier(def.modifier);

    if let Some(json) = &def.default {
        let v = value_from_json(Some(&spec), json).context("invalid default")?;
        spec = spec.default_value(v);
    }
    if let Some(rule) = &def.generate {
        let rule = match rule {
            GenerateDef::Template(t) => GenerationRule::Template(t.clone()),
            GenerateDef::CopyOf(f) => GenerationRule::CopyOf(f.clone()),
            GenerateDef::Static(json) => GenerationRule::Static(
                value_from_json(Some(&spec), json).context("invalid static value")?,
            ),
            GenerateDef::Uuid => GenerationRule::Uuid,
        };
        spec = spec.generate(rule);
    }
    if let Some(keys) = &def.identity_keys {
        spec = spec.identity_keys(keys.iter().cloned());
    }
    for v in &def.validators {
        spec = spec.validate(validator(v));
    }
    for v in &def.element_validators {
        spec = spec.validate_elements(validator(v));
    }
    Ok(spec)
}

fn validator(def: &ValidatorDef) -> Validator {
    match def {
        ValidatorDef::LengthAtLeast(n) => Validator::LengthAtLeast(*n),
        ValidatorDef::LengthAtMost(n) => Validator::LengthAtMost(*n),
        ValidatorDef::SizeBetween { min, max } => Validator::SizeBetween {
            min: *min,
            max: *max,
        },
    }
}

/// Converts the `resources:` section of a loaded document into a registry.
pub fn registry_from_config(loaded: &LoadedConfig) -> Result<SchemaRegistry> {
    let doc: SchemaDocument = serde_json::from_value(loaded.config_json.clone())
        .context("invalid schema document")?;

    let mut registry = SchemaRegistry::new();
    for (resource_type, def) in doc.resources {
        let schema = schema_from_attributes(&def.attributes)
            .with_context(|| format!("resource type '{resource_type}'"))?;
        registry.register(resource_type, schema)?;
    }
    Ok(registry)
}
