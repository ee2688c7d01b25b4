//! JSON interchange for compiled graphs and variable records
//!
//! Graphs serialize as `{ "steps": { name: step } }`. Variable records are
//! flat JSON objects of scalars; whole numbers are written as integers.

use crate::types::graph::StepGraph;
use crate::types::value::Value;
use anyhow::{Context, bail};
use std::collections::BTreeMap;

/// Serialize a compiled graph to pretty-printed JSON
pub fn graph_to_json(graph: &StepGraph) -> anyhow::Result<String> {
    let json = serde_json::to_string_pretty(graph)?;
    Ok(json)
}

/// Load a compiled graph from JSON
pub fn graph_from_json(json: &str) -> anyhow::Result<StepGraph> {
    let graph: StepGraph = serde_json::from_str(json).context("invalid step graph JSON")?;
    for (key, step) in &graph.steps {
        if key != &step.name {
            bail!("step stored under '{key}' is named '{}'", step.name);
        }
    }
    Ok(graph)
}

/// Serialize a variable record to bytes
pub fn save_variables(vars: &BTreeMap<String, Value>) -> anyhow::Result<Vec<u8>> {
    let object: serde_json::Map<String, serde_json::Value> = vars
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect();
    let json = serde_json::to_string_pretty(&object)?;
    Ok(json.into_bytes())
}

/// Load a variable record from bytes
pub fn load_variables(bytes: &[u8]) -> anyhow::Result<BTreeMap<String, Value>> {
    let json = std::str::from_utf8(bytes).context("variable record is not UTF-8")?;
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).context("variable record is not a JSON object")?;

    let mut vars = BTreeMap::new();
    for (name, raw) in object {
        let Some(value) = Value::from_json(&raw) else {
            bail!("variable '{name}' holds a non-scalar value: {raw}");
        };
        vars.insert(name, value);
    }
    Ok(vars)
}
