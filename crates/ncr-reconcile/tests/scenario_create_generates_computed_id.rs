//! First reconciliation of a resource: no prior state.
//!
//! GREEN when:
//! - a computed id configured as Unknown gets a generated value
//! - caller-supplied attributes pass through untouched
//! - the action is Create ("none-prior-exists") with no diagnostics
//! - generation is deterministic across repeated calls

use ncr_reconcile::*;
use ncr_schemas::{AttributeSpec, Config, ModifierKind, Schema, Value};

fn router_schema() -> Schema {
    Schema::new(vec![
        AttributeSpec::scalar("id")
            .computed()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar("name").required(),
    ])
    .unwrap()
}

fn config() -> Config {
    let mut c = Config::new();
    c.insert("id".into(), Value::Unknown);
    c.insert("name".into(), Value::string("router1"));
    c
}

#[test]
fn scenario_create_generates_computed_id() {
    let result = reconcile(&router_schema(), None, &config()).unwrap();

    assert_eq!(result.action, Action::Create);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.new_state["name"], Value::string("router1"));

    let id = &result.new_state["id"];
    assert!(id.is_known(), "id must be generated, got {id}");
    assert!(!result.new_state.values().any(Value::contains_unknown));
}

#[test]
fn generated_id_is_deterministic() {
    let a = reconcile(&router_schema(), None, &config()).unwrap();
    let b = reconcile(&router_schema(), None, &config()).unwrap();
    assert_eq!(a.new_state, b.new_state);
}

#[test]
fn resource_type_seeds_generated_id() {
    let policy = EnginePolicy::default();
    let a = reconcile_with_policy("example_router", &router_schema(), None, &config(), &policy)
        .unwrap();
    let b = reconcile_with_policy("example_network", &router_schema(), None, &config(), &policy)
        .unwrap();
    assert_ne!(a.new_state["id"], b.new_state["id"]);
}

#[test]
fn omitted_computed_id_is_generated_too() {
    let mut c = Config::new();
    c.insert("name".into(), Value::string("router1"));
    let result = reconcile(&router_schema(), None, &c).unwrap();
    assert!(result.new_state["id"].is_known());
    // computed-only fields are not "synthesized defaults"
    assert!(result.diagnostics.is_empty());
}

#[test]
fn existing_id_is_carried_forward() {
    let created = reconcile(&router_schema(), None, &config()).unwrap();

    let mut renamed = config();
    renamed.insert("name".into(), Value::string("router2"));
    let updated = reconcile(&router_schema(), Some(&created.new_state), &renamed).unwrap();

    assert_eq!(updated.action, Action::UpdateInPlace);
    assert_eq!(updated.new_state["id"], created.new_state["id"]);
    assert_eq!(updated.new_state["name"], Value::string("router2"));
}
