//! Transformation pipeline: turn sanitized policy source of either dialect
//! into a directly executable statement sequence (CommonJS, no
//! import/export syntax).
//!
//! The host toolchain is probed exactly once per process (the app owns the
//! `OnceLock`); the resulting [`ToolchainCapabilities`] value is immutable
//! and passed into the pipeline rather than read from ambient state. Which
//! transformation applies is a closed dispatch table over
//! (dialect, capabilities, toggles) — see [`TransformPlan`].

#![forbid(unsafe_code)]

mod config;
mod pipeline;
mod plan;
mod probe;

pub use config::{find_compiler_config, interoperable_project_config};
pub use pipeline::{TransformError, TransformPipeline};
pub use plan::{plan_for, TransformPlan, TransformToggles};
pub use probe::{BabelToolchain, ToolchainCapabilities};

/// Directory segment marking third-party dependency code. Files under it
/// are never transformed; transformation is reserved for first-party
/// policy code.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// True when `path` lies inside a dependency directory.
pub fn in_dependency_dir(path: &camino::Utf8Path) -> bool {
    path.components()
        .any(|c| c.as_str() == DEPENDENCY_DIR)
}
