//! Shared test helpers for the revet workspace.
//!
//! Kept as a real crate (not `#[cfg(test)]` modules) so the CLI's
//! integration tests and the engine crates can share the same canned
//! review-context document and policy-file scaffolding.

use camino::{Utf8Path, Utf8PathBuf};

/// A small but representative input document: a few changed files, one
/// commit, no settings.
pub fn sample_input_json() -> String {
    serde_json::json!({
        "review": {
            "git": {
                "modified_files": ["src/lib.rs", "README.md"],
                "created_files": ["src/new_module.rs"],
                "deleted_files": [],
                "commits": [
                    { "sha": "a1b2c3d", "message": "Add new module" }
                ]
            },
            "platform": {
                "pr": { "title": "Add new module", "body": "", "number": 42 }
            }
        }
    })
    .to_string()
}

/// Write a policy file into `dir` and return its path.
pub fn write_policy(dir: &Utf8Path, name: &str, source: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    // Helper for tests; failing loudly here is the useful behavior.
    std::fs::write(path.as_std_path(), source)
        .unwrap_or_else(|err| panic!("write policy file {path}: {err}"));
    path
}

/// Write an input-document JSON file into `dir` and return its path.
pub fn write_input(dir: &Utf8Path, json: &str) -> Utf8PathBuf {
    let path = dir.join("input.json");
    std::fs::write(path.as_std_path(), json)
        .unwrap_or_else(|err| panic!("write input document {path}: {err}"));
    path
}
