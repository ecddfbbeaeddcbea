use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Stable schema identifier for the serialized run result.
pub const SCHEMA_RESULTS_V1: &str = "revet.results.v1";

/// One emitted review observation.
///
/// Judgments are append-only: there is no retraction, and emission order is
/// preserved within each list of [`RunResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Judgment {
    pub message: String,

    /// Opaque messaging options forwarded to reporting collaborators
    /// (kept open-ended for forward compatibility).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<JsonValue>,
}

impl Judgment {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Judgment {
            message: message.into(),
            options: None,
        }
    }

    pub fn with_options<S: Into<String>>(message: S, options: JsonValue) -> Self {
        Judgment {
            message: message.into(),
            options: Some(options),
        }
    }
}

/// The aggregated, immutable outcome of one policy run.
///
/// Exactly four top-level lists; synchronous emissions precede asynchronous
/// ones, and across scheduled tasks emissions are appended in completion
/// order. This structure is the contract consumed by external reporting
/// collaborators and must remain stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunResult {
    pub fails: Vec<Judgment>,
    pub warnings: Vec<Judgment>,
    pub messages: Vec<Judgment>,
    pub markdowns: Vec<String>,
}

impl RunResult {
    /// True when the reviewed change violates policy (any `fail` emitted).
    pub fn has_fails(&self) -> bool {
        !self.fails.is_empty()
    }
}
