//! `example_computed` fixture: one attribute per modifier kind, driven
//! through transitions of prior -> configured values.
//!
//! GREEN when every row of the transition table classifies as listed.

use ncr_reconcile::{reconcile, Action};
use ncr_schemas::{State, Value};
use ncr_testkit::*;

fn s(v: &str) -> Value {
    Value::string(v)
}

fn list(items: &[&str]) -> Value {
    Value::List(items.iter().map(|v| s(v)).collect())
}

fn prior(attr: &str, v: Value) -> State {
    let mut st = object([
        ("id", s("id-1")),
        ("replace", Value::Null),
        ("replace_if_configured", Value::Null),
        ("use_state_for_unknown", Value::Null),
    ]);
    st.insert(attr.to_string(), v);
    st
}

fn config(attr: &str, v: Value) -> State {
    let mut c = object([("id", Value::Unknown)]);
    c.insert(attr.to_string(), v);
    c
}

#[test]
fn scenario_modifier_transition_table() {
    let rows: Vec<(&str, Value, Value, Action)> = vec![
        // ForceReplace: only known -> different known
        ("replace", s("a"), s("a"), Action::NoOp),
        ("replace", s("a"), s("b"), Action::Replace),
        ("replace", Value::Null, s("b"), Action::UpdateInPlace),
        ("replace", s("a"), Value::Null, Action::Replace),
        // ForceReplaceIfConfigured: configured value that differs
        ("replace_if_configured", Value::Null, s("b"), Action::Replace),
        ("replace_if_configured", s("a"), s("b"), Action::Replace),
        ("replace_if_configured", s("a"), Value::Null, Action::UpdateInPlace),
        ("replace_if_configured", s("a"), s("a"), Action::NoOp),
        // PreservePriorIfUnknown: Unknown carries prior, Null prior included
        ("use_state_for_unknown", s("a"), Value::Unknown, Action::NoOp),
        ("use_state_for_unknown", Value::Null, Value::Unknown, Action::NoOp),
        ("use_state_for_unknown", s("a"), s("b"), Action::UpdateInPlace),
        // string list under ForceReplaceIfConfigured compares as a whole
        ("list_optional", Value::Null, list(&["a"]), Action::Replace),
        ("list_optional", list(&["a"]), list(&["a", "b"]), Action::Replace),
        ("list_optional", list(&["a"]), Value::Null, Action::UpdateInPlace),
        ("list_optional", list(&["a", "b"]), list(&["a", "b"]), Action::NoOp),
    ];

    let schema = computed_schema();
    for (attr, before, after, expected) in rows {
        let p = prior(attr, before.clone());
        let result = reconcile(&schema, Some(&p), &config(attr, after.clone())).unwrap();
        assert_eq!(
            result.action, expected,
            "{attr}: {before} -> {after} should be {expected:?}"
        );
        assert_eq!(result.new_state["id"], s("id-1"));
    }
}

#[test]
fn preserved_value_lands_in_new_state() {
    let p = prior("use_state_for_unknown", s("kept"));
    let result = reconcile(
        &computed_schema(),
        Some(&p),
        &config("use_state_for_unknown", Value::Unknown),
    )
    .unwrap();
    assert_eq!(result.new_state["use_state_for_unknown"], s("kept"));
}

#[test]
fn replace_is_monotonic_across_attributes() {
    // A replace signal from one attribute survives unrelated in-place edits.
    let p = prior("replace", s("a"));
    let mut c = config("replace", s("b"));
    c.insert("use_state_for_unknown".into(), s("new"));

    let result = reconcile(&computed_schema(), Some(&p), &c).unwrap();
    assert_eq!(result.action, Action::Replace);
}

#[test]
fn nothing_replaces_on_create() {
    let mut c = config("replace", s("a"));
    c.insert("replace_if_configured".into(), s("b"));
    let result = reconcile(&computed_schema(), None, &c).unwrap();
    assert_eq!(result.action, Action::Create);
}
