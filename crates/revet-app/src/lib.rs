//! Use case orchestration for revet.
//!
//! This crate wires the layers together for one policy run: load, sanitize,
//! transform, execute, serialize. It is intentionally thin and delegates
//! the heavy lifting to the engine crates.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod report;
mod run;

pub use report::{results_envelope, run_exit_code, serialize_envelope, ResultsEnvelope, ToolMeta};
pub use run::{find_policy_file, run_policy, PolicySource, RunInput, POLICY_FILE_CANDIDATES};
