//! Action classification driven by per-attribute modifiers.
//!
//! GREEN when:
//! - a ForceReplace attribute changing between known values => Replace
//! - any other change => UpdateInPlace, no change => NoOp
//! - ForceReplaceIfConfigured fires on unset -> set, not on set -> unset
//! - PreservePriorIfUnknown carries a Null prior forward as Null
//! - a ForceReplace change inside a collection element replaces the resource
//! - a non-computed attribute configured as Unknown is a GenerationFailure

use ncr_reconcile::*;
use ncr_schemas::{AttributePath, AttributeSpec, Config, ModifierKind, Object, Schema, State, Value};

fn schema() -> Schema {
    Schema::new(vec![
        AttributeSpec::scalar("id")
            .computed()
            .modifier(ModifierKind::PreservePriorIfUnknown),
        AttributeSpec::scalar("name")
            .required()
            .modifier(ModifierKind::ForceReplace),
        AttributeSpec::scalar("description").optional(),
        AttributeSpec::scalar("replace_if_configured")
            .optional()
            .modifier(ModifierKind::ForceReplaceIfConfigured),
        AttributeSpec::scalar("use_state_for_unknown")
            .optional()
            .modifier(ModifierKind::PreservePriorIfUnknown),
    ])
    .unwrap()
}

fn prior() -> State {
    let mut s = State::new();
    s.insert("id".into(), Value::string("id-1"));
    s.insert("name".into(), Value::string("a"));
    s.insert("description".into(), Value::Null);
    s.insert("replace_if_configured".into(), Value::Null);
    s.insert("use_state_for_unknown".into(), Value::Null);
    s
}

fn config() -> Config {
    let mut c = Config::new();
    c.insert("id".into(), Value::Unknown);
    c.insert("name".into(), Value::string("a"));
    c
}

#[test]
fn unchanged_config_is_noop() {
    let result = reconcile(&schema(), Some(&prior()), &config()).unwrap();
    assert_eq!(result.action, Action::NoOp);
    assert_eq!(result.new_state["id"], Value::string("id-1"));
}

#[test]
fn scenario_force_replace_attribute_change_replaces() {
    let mut c = config();
    c.insert("name".into(), Value::string("b"));

    let result = reconcile(&schema(), Some(&prior()), &c).unwrap();

    assert_eq!(result.action, Action::Replace);
    assert_eq!(result.new_state["name"], Value::string("b"));
    assert_eq!(result.new_state["id"], Value::string("id-1"));
}

#[test]
fn plain_attribute_change_updates_in_place() {
    let mut c = config();
    c.insert("description".into(), Value::string("edge router"));

    let result = reconcile(&schema(), Some(&prior()), &c).unwrap();
    assert_eq!(result.action, Action::UpdateInPlace);
}

#[test]
fn replace_wins_over_other_changes() {
    let mut c = config();
    c.insert("name".into(), Value::string("b"));
    c.insert("description".into(), Value::string("edge router"));

    let result = reconcile(&schema(), Some(&prior()), &c).unwrap();
    assert_eq!(result.action, Action::Replace);
}

#[test]
fn replace_if_configured_fires_on_unset_to_set() {
    let mut c = config();
    c.insert("replace_if_configured".into(), Value::string("v"));

    let result = reconcile(&schema(), Some(&prior()), &c).unwrap();
    assert_eq!(result.action, Action::Replace);
}

#[test]
fn replace_if_configured_does_not_fire_on_set_to_unset() {
    let mut p = prior();
    p.insert("replace_if_configured".into(), Value::string("v"));

    let result = reconcile(&schema(), Some(&p), &config()).unwrap();
    assert_eq!(result.action, Action::UpdateInPlace);
    assert_eq!(result.new_state["replace_if_configured"], Value::Null);
}

#[test]
fn preserve_prior_with_null_prior_resolves_to_null() {
    let mut c = config();
    c.insert("use_state_for_unknown".into(), Value::Unknown);

    let result = reconcile(&schema(), Some(&prior()), &c).unwrap();

    assert_eq!(result.new_state["use_state_for_unknown"], Value::Null);
    assert_eq!(result.action, Action::NoOp);
}

#[test]
fn first_reconciliation_never_replaces() {
    let mut c = config();
    c.insert("replace_if_configured".into(), Value::string("v"));

    let result = reconcile(&schema(), None, &c).unwrap();
    assert_eq!(result.action, Action::Create);
}

#[test]
fn unknown_on_non_computed_attribute_is_generation_failure() {
    let mut c = config();
    c.insert("description".into(), Value::Unknown);

    let failure = reconcile(&schema(), Some(&prior()), &c).unwrap_err();

    assert_eq!(failure.stage, Stage::ResolvingAttributes);
    let d = failure.fatal().next().unwrap();
    assert_eq!(d.code, DiagnosticCode::GenerationFailure);
    assert_eq!(d.path, AttributePath::attr("description"));
}

#[test]
fn force_replace_inside_list_element_replaces_resource() {
    let nic = Schema::new(vec![
        AttributeSpec::scalar("name").required(),
        AttributeSpec::scalar("fixed_ip")
            .optional()
            .modifier(ModifierKind::ForceReplace),
    ])
    .unwrap();
    let schema = Schema::new(vec![AttributeSpec::list("nics", nic).required()]).unwrap();

    let nic_value = |ip: &str| {
        Value::object([
            ("name", Value::string("eth0")),
            ("fixed_ip", Value::string(ip)),
        ])
    };
    let mut prior = Object::new();
    prior.insert("nics".into(), Value::List(vec![nic_value("10.0.0.1")]));
    let mut c = Config::new();
    c.insert("nics".into(), Value::List(vec![nic_value("10.0.0.2")]));

    let result = reconcile(&schema, Some(&prior), &c).unwrap();
    assert_eq!(result.action, Action::Replace);

    let same = reconcile(&schema, Some(&prior), &prior.clone()).unwrap();
    assert_eq!(same.action, Action::NoOp);
}
