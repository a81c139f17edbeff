use super::{path_refs, read_json_file};
use anyhow::{bail, Context, Result};
use ncr_config::{load_layered_yaml, load_policy, registry_from_config, UnusedKeyPolicy};
use ncr_reconcile::{handle_request, EnginePolicy, ReconcileRequest, ReconcileResponse};
use ncr_schemas::codec::object_from_json;
use serde_json::Value;
use tracing::{info, warn};

pub struct ReconcileArgs<'a> {
    pub schema_paths: &'a [String],
    pub resource_type: &'a str,
    pub prior_path: Option<&'a str>,
    pub config_path: &'a str,
    pub policy_paths: &'a [String],
    pub strict_policy_keys: bool,
}

/// Loads schemas, policy and documents, reconciles, and prints the response
/// as JSON. A fatal response is printed first, then reported as an error.
pub fn run_reconcile(args: &ReconcileArgs<'_>) -> Result<()> {
    let schemas = load_layered_yaml(&path_refs(args.schema_paths))?;
    let registry = registry_from_config(&schemas)?;
    info!(
        schemas_hash = %schemas.config_hash,
        resource_types = registry.len(),
        "schemas loaded"
    );

    let policy = load_engine_policy(args.policy_paths, args.strict_policy_keys)?;

    let schema = registry.get(args.resource_type);
    let prior_state = match args.prior_path {
        Some(p) => match read_json_file(p)? {
            Value::Null => None,
            json => Some(
                object_from_json(schema.as_deref(), &json)
                    .with_context(|| format!("invalid prior state in {p}"))?,
            ),
        },
        None => None,
    };
    let desired_config = object_from_json(schema.as_deref(), &read_json_file(args.config_path)?)
        .with_context(|| format!("invalid config in {}", args.config_path))?;

    let request = ReconcileRequest {
        resource_type: args.resource_type.to_string(),
        prior_state,
        desired_config,
    };
    let response = handle_request(&registry, &policy, &request);
    print_response(&response)?;

    if response.is_fatal() {
        let fatal = response.diagnostics.iter().filter(|d| d.is_fatal()).count();
        bail!(
            "RECONCILE_FAILED resource_type={}: {} fatal diagnostic(s)",
            args.resource_type,
            fatal
        );
    }
    Ok(())
}

fn load_engine_policy(paths: &[String], strict_keys: bool) -> Result<EnginePolicy> {
    if paths.is_empty() {
        return Ok(EnginePolicy::default());
    }
    let loaded = load_layered_yaml(&path_refs(paths))?;
    let unused = if strict_keys {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let (policy, report) = load_policy(&loaded, unused)?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "policy has keys the engine does not read");
    }
    Ok(policy)
}

fn print_response(response: &ReconcileResponse) -> Result<()> {
    let out = serde_json::to_string_pretty(response).context("serialize response failed")?;
    println!("{out}");
    Ok(())
}

/// `schema-hash`: validates the layered schema documents and prints their
/// hash, resource types and canonical JSON.
pub fn run_schema_hash(paths: &[String]) -> Result<()> {
    let loaded = load_layered_yaml(&path_refs(paths))?;
    let registry = registry_from_config(&loaded)?;
    println!("schemas_hash={}", loaded.config_hash);
    println!(
        "resource_types={}",
        registry.resource_types().collect::<Vec<_>>().join(",")
    );
    println!("{}", loaded.canonical_json);
    Ok(())
}
