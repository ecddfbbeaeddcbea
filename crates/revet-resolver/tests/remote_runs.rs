//! A remote-originated run end to end: root reference, transitive imports
//! across directories, extension fallback, emissions through the sandbox.

use camino::Utf8PathBuf;
use revet_resolver::{FetchError, RefFetcher, RemoteRef, RemoteResolver};
use revet_runtime::{execute, ExecutionBudgets, ExecutionRequest};
use revet_transform::{ToolchainCapabilities, TransformPipeline, TransformToggles};
use std::sync::{Arc, Mutex};

struct TreeFetcher {
    files: Vec<(&'static str, &'static str)>,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl RefFetcher for TreeFetcher {
    fn fetch(&self, reference: &RemoteRef) -> Result<Option<String>, FetchError> {
        let name = reference.to_string();
        self.attempts.lock().expect("attempts lock").push(name.clone());
        Ok(self
            .files
            .iter()
            .find(|(file, _)| *file == name)
            .map(|(_, text)| (*text).to_string()))
    }
}

#[test]
fn remote_policy_with_transitive_imports_runs_to_completion() {
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let fetcher = TreeFetcher {
        files: vec![
            (
                "org/repo/rules.ts@main",
                concat!(
                    "import { warn } from \"revet\";\n",
                    "var checks = require(\"./lib/checks\");\n",
                    "checks.run();\n",
                    "warn(\"review checked remotely\");\n",
                ),
            ),
            (
                "org/repo/lib/checks.ts@main",
                concat!(
                    "var util = require(\"../util\");\n",
                    "exports.run = function () {\n",
                    "  message(util.count(review) + \" files changed\");\n",
                    "};\n",
                ),
            ),
            // Only the .js variant exists, so resolution must fall back.
            (
                "org/repo/util.js@main",
                "exports.count = function (r) { return r.git.modified_files.length; };\n",
            ),
        ],
        attempts: attempts.clone(),
    };

    // No probed toolchain: sources pass through the pipeline unchanged.
    let pipeline = TransformPipeline::new(
        ToolchainCapabilities::default(),
        TransformToggles::default(),
        Utf8PathBuf::from("."),
    );
    let resolver = RemoteResolver::new(Box::new(fetcher), pipeline);
    let root = resolver.resolve_root("org/repo/rules").expect("root resolves");
    assert_eq!(root.id, "org/repo/rules.ts@main");

    let result = execute(ExecutionRequest {
        origin: root.id,
        source: root.source,
        review: serde_json::json!({ "git": { "modified_files": ["a.rs", "b.rs", "c.rs"] } }),
        resolver: Box::new(resolver),
        budgets: ExecutionBudgets::default(),
    })
    .expect("run finalizes");

    assert_eq!(result.messages[0].message, "3 files changed");
    assert_eq!(result.warnings[0].message, "review checked remotely");

    // The fetch trail shows extension priority: ts first everywhere, with
    // the util module found only on the js fallback.
    assert_eq!(
        *attempts.lock().expect("attempts lock"),
        vec![
            "org/repo/rules.ts@main".to_string(),
            "org/repo/lib/checks.ts@main".to_string(),
            "org/repo/util.ts@main".to_string(),
            "org/repo/util.js@main".to_string(),
        ]
    );
}
