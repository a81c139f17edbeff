//! Fixture resource schemas and helpers for cross-crate scenario tests.
//!
//! The fixtures model four provider-style resources:
//! - `example_router`: plan modifiers, string validators, a set keyed by an
//!   optional field
//! - `example_set_nested`: a set of objects whose elements carry generated
//!   port/mac/ip values
//! - `example_set_list`: a set and a list of plain strings
//! - `example_computed`: one attribute per modifier kind

use ncr_reconcile::{
    check_apply_gate, reconcile_with_policy, ApplyGate, EnginePolicy, ReconcileFailure,
    ReconciliationResult, SchemaRegistry,
};
use ncr_schemas::{
    AttributeSpec, Config, GenerationRule, ModifierKind, NamedPredicate, Object, Schema, State,
    Validator, Value,
};

pub const ROUTER: &str = "example_router";
pub const SET_NESTED: &str = "example_set_nested";
pub const SET_LIST: &str = "example_set_list";
pub const COMPUTED: &str = "example_computed";

/// Characters a router name may never contain.
const FORBIDDEN_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

fn is_cjk_punctuation(c: char) -> bool {
    ('\u{3000}'..='\u{303F}').contains(&c)
}

/// Router names: no path/shell metacharacters, no full-width punctuation,
/// and no leading or trailing dot.
pub fn router_name_predicate() -> NamedPredicate {
    NamedPredicate::new(
        "router_name",
        "must not contain full-width punctuation or any of / \\ : * ? \" < > |, and must not start or end with '.'",
        |s| {
            !s.starts_with('.')
                && !s.ends_with('.')
                && !s
                    .chars()
                    .any(|c| FORBIDDEN_NAME_CHARS.contains(&c) || is_cjk_punctuation(c))
        },
    )
}

fn build(attrs: Vec<AttributeSpec>) -> Schema {
    match Schema::new(attrs) {
        Ok(s) => s,
        Err(e) => panic!("fixture schema is invalid: {e}"),
    }
}

pub fn router_schema() -> Schema {
    let fixed_ip = build(vec![
        AttributeSpec::scalar("subnet_id")
            .optional()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar("ip_address")
            .optional()
            .computed()
            .modifier(ModifierKind::PreservePriorIfUnknown),
    ]);
    build(vec![
        AttributeSpec::scalar("id")
            .computed()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar("tenant_id")
            .required()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar("name")
            .required()
            .validate(Validator::LengthAtLeast(1))
            .validate(Validator::LengthAtMost(32))
            .validate(Validator::Predicate(router_name_predicate())),
        AttributeSpec::scalar("description")
            .optional()
            .validate(Validator::LengthAtMost(128)),
        AttributeSpec::scalar("external_network_id")
            .optional()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar("external_enable_snat").optional(),
        AttributeSpec::set("external_fixed_ips", fixed_ip)
            .optional()
            .modifier(ModifierKind::PreservePriorIfUnknown)
            .identity_keys(["subnet_id"]),
    ])
}

pub fn set_nested_element_schema() -> Schema {
    build(vec![
        AttributeSpec::scalar("uuid").required(),
        AttributeSpec::scalar("fixed_ip")
            .optional()
            .computed()
            .generate(GenerationRule::Template("fixed_ip_{seq}".into())),
        AttributeSpec::scalar("fixed_ip_v4")
            .computed()
            .generate(GenerationRule::CopyOf("fixed_ip".into())),
        AttributeSpec::scalar("port")
            .computed()
            .generate(GenerationRule::Template("port_id_{seq}".into())),
        AttributeSpec::scalar("mac")
            .computed()
            .generate(GenerationRule::Template("mac_address_{seq}".into())),
        AttributeSpec::scalar("enable_gateway")
            .optional()
            .computed()
            .default_value(false),
    ])
}

pub fn set_nested_schema() -> Schema {
    build(vec![
        AttributeSpec::scalar("id")
            .computed()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::set("set_nested", set_nested_element_schema()).optional(),
    ])
}

pub fn set_list_schema() -> Schema {
    build(vec![
        AttributeSpec::scalar("id")
            .computed()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar_set("test_set")
            .optional()
            .validate(Validator::SizeBetween { min: 0, max: 16 })
            .validate_elements(Validator::LengthAtMost(255)),
        AttributeSpec::scalar_list("test_list")
            .optional()
            .validate(Validator::SizeBetween { min: 0, max: 16 })
            .validate_elements(Validator::LengthAtMost(255)),
    ])
}

pub fn computed_schema() -> Schema {
    build(vec![
        AttributeSpec::scalar("id")
            .computed()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar("replace")
            .optional()
            .modifier(ModifierKind::ForceReplace),
        AttributeSpec::scalar("replace_if_configured")
            .optional()
            .modifier(ModifierKind::ForceReplaceIfConfigured),
        AttributeSpec::scalar("use_state_for_unknown")
            .optional()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar_list("list_optional")
            .optional()
            .modifier(ModifierKind::ForceReplaceIfConfigured),
    ])
}

/// Registry holding every fixture resource type.
pub fn fixture_registry() -> SchemaRegistry {
    let mut r = SchemaRegistry::new();
    for (resource_type, schema) in [
        (ROUTER, router_schema()),
        (SET_NESTED, set_nested_schema()),
        (SET_LIST, set_list_schema()),
        (COMPUTED, computed_schema()),
    ] {
        if let Err(e) = r.register(resource_type, schema) {
            panic!("fixture registry: {e}");
        }
    }
    r
}

/// Builds an attribute mapping from `(name, value)` pairs.
pub fn object<const N: usize>(fields: [(&str, Value); N]) -> Object {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// A `set_nested` element carrying only its uuid (plus optional fixed_ip).
pub fn nested_element(uuid: &str, fixed_ip: Option<&str>) -> Value {
    let mut o = object([("uuid", Value::string(uuid))]);
    if let Some(ip) = fixed_ip {
        o.insert("fixed_ip".into(), Value::string(ip));
    }
    Value::Object(o)
}

/// Finds the element of collection `attr` whose `key_field` equals `key`.
pub fn find_element<'a>(state: &'a State, attr: &str, key_field: &str, key: &str) -> Option<&'a Object> {
    state
        .get(attr)?
        .elements()?
        .iter()
        .filter_map(Value::as_object)
        .find(|o| o.get(key_field) == Some(&Value::string(key)))
}

/// Simulated host: holds the persisted state of one resource and applies
/// results only when the gate says so.
pub struct Host {
    pub resource_type: String,
    pub schema: Schema,
    pub policy: EnginePolicy,
    pub state: Option<State>,
    pub applied: usize,
}

impl Host {
    pub fn new(resource_type: &str, schema: Schema) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            schema,
            policy: EnginePolicy::default(),
            state: None,
            applied: 0,
        }
    }

    /// Reconciles `config` against the persisted state and persists the
    /// outcome through the apply gate.
    pub fn plan_and_apply(&mut self, config: &Config) -> Result<ReconciliationResult, ReconcileFailure> {
        let outcome = reconcile_with_policy(
            &self.resource_type,
            &self.schema,
            self.state.as_ref(),
            config,
            &self.policy,
        );
        if let ApplyGate::Apply { new_state, .. } = check_apply_gate(&outcome) {
            self.state = Some(new_state.clone());
            self.applied += 1;
        }
        outcome
    }
}
