//! Command handler modules for ncr-cli.
//!
//! Shared file helpers live here; command logic lives in the submodules.

pub mod reconcile;

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;

/// Reads a JSON document, tolerating a UTF-8 BOM (editors on Windows add one).
pub fn read_json_file(path: &str) -> Result<Value> {
    let bytes = fs::read(path).with_context(|| format!("read json file failed: {path}"))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let raw = std::str::from_utf8(bytes).with_context(|| format!("{path} must be UTF-8 text"))?;
    serde_json::from_str(raw.trim()).with_context(|| format!("{path} must contain valid JSON"))
}

pub fn path_refs(paths: &[String]) -> Vec<&str> {
    paths.iter().map(String::as_str).collect()
}
