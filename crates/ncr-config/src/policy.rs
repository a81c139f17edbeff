use crate::{report_unused_keys, ConfigKind, LoadedConfig, UnusedKeyPolicy, UnusedKeyReport};
use anyhow::{Context, Result};
use ncr_reconcile::EnginePolicy;

/// Reads the `engine:` section; missing keys keep their defaults (strict
/// ambiguous-identity handling, informational notes on synthesized values).
///
/// Keys the engine does not read are reported per `unused`; with
/// `UnusedKeyPolicy::Fail` they abort loading.
pub fn load_policy(
    loaded: &LoadedConfig,
    unused: UnusedKeyPolicy,
) -> Result<(EnginePolicy, UnusedKeyReport)> {
    let report = report_unused_keys(ConfigKind::Policy, &loaded.config_json, unused)?;

    let policy = match loaded.config_json.get("engine") {
        Some(engine) => serde_json::from_value(engine.clone()).context("invalid engine policy")?,
        None => EnginePolicy::default(),
    };
    Ok((policy, report))
}
