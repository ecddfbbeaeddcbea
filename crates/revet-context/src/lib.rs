//! Input-document model for a policy run.
//!
//! This crate is intentionally IO-free: it parses the JSON document handed
//! to the engine (typically read from standard input or a file by the CLI)
//! into a typed model. The `review` half is what the sandbox sees as its
//! read-only context object; the `settings` half (tokens, CLI-derived
//! arguments) stays host-side and is never exposed to the script.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("invalid input document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The full input document for one run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputDocument {
    /// Data exposed to the sandbox as the `review` global.
    #[serde(default)]
    pub review: ReviewContext,

    /// Host-side settings. Never injected into the sandbox.
    #[serde(default)]
    pub settings: Settings,
}

/// Pre-resolved review data: git change metadata plus whatever the
/// platform adapter collected. This is data, not a live handle — the
/// sandbox gets no ambient filesystem or network access through it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReviewContext {
    #[serde(default)]
    pub git: GitContext,

    /// Platform PR/MR metadata, kept opaque: its shape belongs to the
    /// platform adapter that produced it.
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub platform: JsonValue,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GitContext {
    #[serde(default)]
    pub modified_files: Vec<String>,
    #[serde(default)]
    pub created_files: Vec<String>,
    #[serde(default)]
    pub deleted_files: Vec<String>,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Access token for the source-control host (remote fetches).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Raw-content endpoint override (defaults to the public GitHub one).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content_base: Option<String>,
}

impl InputDocument {
    /// Parse the input document from its JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ContextError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The JSON value injected into the sandbox as the `review` global.
    pub fn review_json(&self) -> JsonValue {
        // Serialization of our own model cannot fail.
        serde_json::to_value(&self.review).unwrap_or(JsonValue::Null)
    }
}
