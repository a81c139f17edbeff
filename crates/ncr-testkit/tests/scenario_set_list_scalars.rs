//! `example_set_list` fixture: collections of plain strings.
//!
//! GREEN when:
//! - string sets compare as multisets (reordering is a no-op) while string
//!   lists keep their order (reordering is an update)
//! - SizeBetween bounds the element count at the collection path
//! - element validators reject an element at its indexed path
//! - a repeated set element is ambiguous, and only informational under the
//!   lenient policy
//! - non-scalar and Unknown elements are rejected before resolution

use ncr_reconcile::{Action, DiagnosticCode, EnginePolicy, Stage};
use ncr_schemas::{Config, Value};
use ncr_testkit::*;

fn strings(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| Value::string(*s)).collect()
}

fn config(set: &[&str], list: &[&str]) -> Config {
    object([
        ("id", Value::Unknown),
        ("test_set", Value::Set(strings(set))),
        ("test_list", Value::List(strings(list))),
    ])
}

#[test]
fn scenario_set_and_list_lifecycle() {
    let mut host = Host::new(SET_LIST, set_list_schema());

    let created = host.plan_and_apply(&config(&["a", "b"], &["x", "y"])).unwrap();
    assert_eq!(created.action, Action::Create);
    assert!(created.diagnostics.is_empty());
    let s1 = host.state.clone().unwrap();
    assert!(s1["id"].is_known());
    assert_eq!(s1["test_set"], Value::Set(strings(&["b", "a"])));
    assert_eq!(s1["test_list"], Value::List(strings(&["x", "y"])));

    let reordered_set = host.plan_and_apply(&config(&["b", "a"], &["x", "y"])).unwrap();
    assert_eq!(reordered_set.action, Action::NoOp);
    assert_eq!(host.applied, 1);

    let reordered_list = host.plan_and_apply(&config(&["a", "b"], &["y", "x"])).unwrap();
    assert_eq!(reordered_list.action, Action::UpdateInPlace);
    let s3 = host.state.as_ref().unwrap();
    assert_eq!(s3["test_list"], Value::List(strings(&["y", "x"])));
    assert_eq!(s3["id"], s1["id"]);
}

#[test]
fn size_bounds_apply_to_the_collection() {
    let many: Vec<String> = (0..17).map(|i| format!("e{i}")).collect();
    let refs: Vec<&str> = many.iter().map(String::as_str).collect();

    let failure =
        ncr_reconcile::reconcile(&set_list_schema(), None, &config(&refs, &[])).unwrap_err();
    let d = failure.fatal().next().unwrap();
    assert_eq!(d.code, DiagnosticCode::ValidationFailure);
    assert_eq!(d.path.to_string(), "test_set");

    assert!(ncr_reconcile::reconcile(&set_list_schema(), None, &config(&refs[..16], &[])).is_ok());
}

#[test]
fn element_validator_reports_indexed_path() {
    let long = "v".repeat(256);
    let failure = ncr_reconcile::reconcile(
        &set_list_schema(),
        None,
        &config(&[], &["ok", long.as_str()]),
    )
    .unwrap_err();

    let d = failure.fatal().next().unwrap();
    assert_eq!(d.code, DiagnosticCode::ValidationFailure);
    assert_eq!(d.path.to_string(), "test_list[1]");
}

#[test]
fn repeated_set_element_is_ambiguous() {
    let c = config(&["a", "b", "a"], &[]);

    let failure = ncr_reconcile::reconcile(&set_list_schema(), None, &c).unwrap_err();
    let at: Vec<String> = failure.fatal().map(|d| d.path.to_string()).collect();
    assert_eq!(at, vec!["test_set[0]", "test_set[2]"]);
    assert!(failure
        .fatal()
        .all(|d| d.code == DiagnosticCode::AmbiguousIdentity));

    let mut host = Host::new(SET_LIST, set_list_schema());
    host.policy = EnginePolicy::lenient_identity();
    let result = host.plan_and_apply(&c).unwrap();
    assert_eq!(result.diagnostics.len(), 2);
    assert!(result.diagnostics.iter().all(|d| !d.is_fatal()));
}

#[test]
fn list_keeps_repeated_elements() {
    let result =
        ncr_reconcile::reconcile(&set_list_schema(), None, &config(&[], &["a", "a"])).unwrap();
    assert_eq!(result.new_state["test_list"], Value::List(strings(&["a", "a"])));
}

#[test]
fn non_scalar_and_unknown_elements_rejected() {
    let mut c = config(&[], &[]);
    c.insert(
        "test_set".into(),
        Value::Set(vec![Value::object([("value", Value::string("a"))])]),
    );
    let failure = ncr_reconcile::reconcile(&set_list_schema(), None, &c).unwrap_err();
    assert_eq!(failure.stage, Stage::ValidatingSchema);
    let d = failure.fatal().next().unwrap();
    assert_eq!(d.code, DiagnosticCode::SchemaViolation);
    assert_eq!(d.path.to_string(), "test_set[0]");

    c.insert(
        "test_set".into(),
        Value::Set(vec![Value::string("a"), Value::Unknown]),
    );
    let failure = ncr_reconcile::reconcile(&set_list_schema(), None, &c).unwrap_err();
    let d = failure.fatal().next().unwrap();
    assert_eq!(d.code, DiagnosticCode::GenerationFailure);
    assert_eq!(d.path.to_string(), "test_set[1]");
}
