//! Serialization of run results for downstream reporting collaborators.

use anyhow::Context;
use revet_types::{RunResult, SCHEMA_RESULTS_V1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// The serialized outcome of a run: the four lists of the result contract
/// at the top level, with the schema identifier and tool metadata as
/// sibling keys so consumers can detect shape changes.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct ResultsEnvelope {
    pub schema: String,
    pub tool: ToolMeta,
    #[serde(flatten)]
    pub results: RunResult,
}

pub fn results_envelope(results: RunResult) -> ResultsEnvelope {
    ResultsEnvelope {
        schema: SCHEMA_RESULTS_V1.to_string(),
        tool: ToolMeta {
            name: "revet".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        results,
    }
}

pub fn serialize_envelope(envelope: &ResultsEnvelope) -> anyhow::Result<String> {
    serde_json::to_string_pretty(envelope).context("serialize results")
}

/// Exit code for a finalized run: violations make the run "red" without
/// being confused with an engine failure.
pub fn run_exit_code(results: &RunResult) -> i32 {
    if results.has_fails() { 1 } else { 0 }
}
