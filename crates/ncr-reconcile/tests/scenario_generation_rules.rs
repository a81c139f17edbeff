//! Computed values produced by generation rules.
//!
//! GREEN when:
//! - Template rules expand `{seq}` from the configured index and skip values
//!   a matched sibling already holds
//! - CopyOf sees the sibling's generated value
//! - defaults apply before generation and are not reported as synthesized
//! - an optional computed field the caller omitted yields one Info diagnostic
//! - validators run on resolved values

use ncr_reconcile::*;
use ncr_schemas::{
    AttributeSpec, Config, GenerationRule, ModifierKind, NamedPredicate, Object, Schema, State,
    Validator, Value,
};

fn element_schema() -> Schema {
    Schema::new(vec![
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
    .unwrap()
}

fn schema() -> Schema {
    Schema::new(vec![AttributeSpec::set("set_nested", element_schema()).required()]).unwrap()
}

fn config(elements: Vec<Value>) -> Config {
    let mut c = Config::new();
    c.insert("set_nested".into(), Value::Set(elements));
    c
}

fn element<'a>(state: &'a State, uuid: &str) -> &'a Object {
    state["set_nested"]
        .elements()
        .unwrap()
        .iter()
        .filter_map(Value::as_object)
        .find(|o| o["uuid"] == Value::string(uuid))
        .unwrap()
}

#[test]
fn scenario_templates_copy_and_defaults_on_create() {
    let c = config(vec![
        Value::object([("uuid", Value::string("a"))]),
        Value::object([
            ("uuid", Value::string("b")),
            ("fixed_ip", Value::string("10.0.0.9")),
        ]),
    ]);

    let result = reconcile(&schema(), None, &c).unwrap();
    assert_eq!(result.action, Action::Create);

    let a = element(&result.new_state, "a");
    assert_eq!(a["fixed_ip"], Value::string("fixed_ip_0"));
    assert_eq!(a["fixed_ip_v4"], Value::string("fixed_ip_0"));
    assert_eq!(a["port"], Value::string("port_id_0"));
    assert_eq!(a["mac"], Value::string("mac_address_0"));
    assert_eq!(a["enable_gateway"], Value::Bool(false));

    let b = element(&result.new_state, "b");
    assert_eq!(b["fixed_ip"], Value::string("10.0.0.9"));
    assert_eq!(b["fixed_ip_v4"], Value::string("10.0.0.9"));
    assert_eq!(b["port"], Value::string("port_id_1"));

    // Only element a's omitted fixed_ip counts as a synthesized default.
    assert_eq!(result.diagnostics.len(), 1);
    let d = &result.diagnostics[0];
    assert_eq!(d.severity, Severity::Info);
    assert_eq!(d.code, DiagnosticCode::Informational);
    assert_eq!(d.path.to_string(), "set_nested[0].fixed_ip");
    assert_eq!(d.message, "fixed_ip omitted, synthesizing default");
}

#[test]
fn synthesized_info_can_be_disabled() {
    let policy = EnginePolicy {
        info_on_synthesized: false,
        ..EnginePolicy::default()
    };
    let c = config(vec![Value::object([("uuid", Value::string("a"))])]);

    let result = reconcile_with_policy("", &schema(), None, &c, &policy).unwrap();
    assert!(result.diagnostics.is_empty());
}

#[test]
fn fresh_element_template_skips_value_held_by_matched_element() {
    let prior_a = Value::object([
        ("uuid", Value::string("a")),
        ("fixed_ip", Value::string("10.0.0.1")),
        ("fixed_ip_v4", Value::string("10.0.0.1")),
        ("port", Value::string("port_id_0")),
        ("mac", Value::string("mac_address_7")),
        ("enable_gateway", Value::Bool(false)),
    ]);
    let mut prior = State::new();
    prior.insert("set_nested".into(), Value::Set(vec![prior_a]));

    // b sits at index 0, where its template would collide with a's port.
    let c = config(vec![
        Value::object([("uuid", Value::string("b"))]),
        Value::object([
            ("uuid", Value::string("a")),
            ("fixed_ip", Value::string("10.0.0.1")),
        ]),
    ]);

    let result = reconcile(&schema(), Some(&prior), &c).unwrap();

    assert_eq!(result.action, Action::UpdateInPlace);
    let a = element(&result.new_state, "a");
    let b = element(&result.new_state, "b");
    assert_eq!(a["port"], Value::string("port_id_0"));
    assert_eq!(a["mac"], Value::string("mac_address_7"));
    assert_eq!(b["port"], Value::string("port_id_1"));
    assert_eq!(b["mac"], Value::string("mac_address_0"));
}

#[test]
fn configured_value_overrides_reused_prior_value() {
    let prior_a = Value::object([
        ("uuid", Value::string("a")),
        ("fixed_ip", Value::string("10.0.0.1")),
        ("fixed_ip_v4", Value::string("10.0.0.1")),
        ("port", Value::string("port_id_0")),
        ("mac", Value::string("mac_address_0")),
        ("enable_gateway", Value::Bool(false)),
    ]);
    let mut prior = State::new();
    prior.insert("set_nested".into(), Value::Set(vec![prior_a]));

    let c = config(vec![Value::object([
        ("uuid", Value::string("a")),
        ("fixed_ip", Value::string("10.0.0.2")),
    ])]);

    let result = reconcile(&schema(), Some(&prior), &c).unwrap();

    let a = element(&result.new_state, "a");
    assert_eq!(a["fixed_ip"], Value::string("10.0.0.2"));
    // fixed_ip_v4 keeps its prior known value; computed reuse wins over regeneration.
    assert_eq!(a["fixed_ip_v4"], Value::string("10.0.0.1"));
    assert_eq!(result.action, Action::UpdateInPlace);
}

#[test]
fn static_rule_and_default_collections() {
    let nested = Schema::new(vec![AttributeSpec::scalar("subnet_id").required()]).unwrap();
    let schema = Schema::new(vec![
        AttributeSpec::scalar("name").required(),
        AttributeSpec::scalar("status")
            .computed()
            .generate(GenerationRule::Static(Value::string("ACTIVE"))),
        AttributeSpec::set("external_fixed_ips", nested)
            .optional()
            .computed(),
    ])
    .unwrap();
    let mut c = Config::new();
    c.insert("name".into(), Value::string("r"));

    let result = reconcile(&schema, None, &c).unwrap();

    assert_eq!(result.new_state["status"], Value::string("ACTIVE"));
    assert_eq!(result.new_state["external_fixed_ips"], Value::Set(Vec::new()));
    // the empty collection is still a synthesized default of an optional computed field
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].path.to_string(), "external_fixed_ips");
}

fn router_schema() -> Schema {
    let no_spaces = NamedPredicate::new("no_spaces", "must not contain spaces", |s| {
        !s.contains(' ')
    });
    Schema::new(vec![
        AttributeSpec::scalar("id")
            .computed()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar("name")
            .required()
            .validate(Validator::LengthAtLeast(1))
            .validate(Validator::LengthAtMost(32))
            .validate(Validator::Predicate(no_spaces)),
        AttributeSpec::scalar("description")
            .optional()
            .validate(Validator::LengthAtMost(128)),
    ])
    .unwrap()
}

fn named(name: &str) -> Config {
    let mut c = Config::new();
    c.insert("name".into(), Value::string(name));
    c
}

#[test]
fn validators_reject_resolved_values() {
    for bad in ["", "a-name-that-is-far-too-long-for-32-chars", "two words"] {
        let failure = reconcile(&router_schema(), None, &named(bad)).unwrap_err();
        let d = failure.fatal().next().unwrap();
        assert_eq!(d.code, DiagnosticCode::ValidationFailure, "name {bad:?}");
        assert_eq!(d.path.to_string(), "name");
    }
}

#[test]
fn length_is_counted_in_characters() {
    let name = "é".repeat(32);
    assert!(reconcile(&router_schema(), None, &named(&name)).is_ok());
}

#[test]
fn first_failing_validator_in_declaration_order_wins() {
    let mut c = named("two words");
    c.insert("description".into(), Value::string("x".repeat(129)));

    let failure = reconcile(&router_schema(), None, &c).unwrap_err();
    let fatal: Vec<&Diagnostic> = failure.fatal().collect();
    assert_eq!(fatal.len(), 1);
    assert_eq!(fatal[0].path.to_string(), "name");
}
