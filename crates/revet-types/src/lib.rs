//! Stable DTOs shared across the revet workspace.
//!
//! This crate is intentionally boring:
//! - the result contract emitted after a policy run
//! - the fatal run-error taxonomy
//! - stable schema identifiers
//!
//! Everything here is consumed by external reporting tooling that diffs
//! results across runs, so the serialized shapes must not drift.

#![forbid(unsafe_code)]

mod dialect;
mod error;
mod results;

pub use dialect::Dialect;
pub use error::{RunError, RunErrorKind};
pub use results::{Judgment, RunResult, SCHEMA_RESULTS_V1};
