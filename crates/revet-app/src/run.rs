//! The policy-run use case: load a script, make it executable, run it.

use camino::{Utf8Path, Utf8PathBuf};
use revet_context::InputDocument;
use revet_resolver::{RawContentFetcher, RemoteResolver};
use revet_runtime::{execute, ExecutionBudgets, ExecutionRequest, NoRemoteContext};
use revet_sanitize::PolicyScript;
use revet_transform::{ToolchainCapabilities, TransformPipeline, TransformToggles};
use revet_types::{RunError, RunResult};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Default policy file names, tried in this order.
pub const POLICY_FILE_CANDIDATES: [&str; 2] = ["revetfile.ts", "revetfile.js"];

/// Where the policy script comes from.
#[derive(Clone, Debug)]
pub enum PolicySource {
    /// A file on disk.
    Local(Utf8PathBuf),
    /// An `owner/repo/path[@branch]` reference fetched from the host.
    Remote(String),
}

pub struct RunInput {
    pub policy: PolicySource,
    pub document: InputDocument,
    /// Working directory: anchors toolchain probing and compiler-config
    /// discovery.
    pub cwd: Utf8PathBuf,
    pub budgets: ExecutionBudgets,
}

/// Locate the default policy file in `dir`, TypeScript first.
pub fn find_policy_file(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    POLICY_FILE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Probed once per process: the toolchain does not change mid-run, and
/// probing shells out to `--version`.
fn toolchain(cwd: &Utf8Path) -> &'static ToolchainCapabilities {
    static CAPS: OnceLock<ToolchainCapabilities> = OnceLock::new();
    CAPS.get_or_init(|| ToolchainCapabilities::probe(cwd))
}

/// Run one policy script against the input document and aggregate its
/// judgments.
pub fn run_policy(input: RunInput) -> Result<RunResult, RunError> {
    let pipeline = TransformPipeline::new(
        toolchain(&input.cwd).clone(),
        TransformToggles::from_env(),
        input.cwd.clone(),
    );
    let review = input.document.review_json();

    match input.policy {
        PolicySource::Local(path) => {
            info!(policy = %path, "running local policy");
            let script = PolicyScript::load_local(&path).map_err(|err| RunError::Load {
                origin: path.to_string(),
                reason: err.to_string(),
            })?;
            let sanitized = script.sanitized_text();
            debug!(origin = %path, "dsl imports sanitized");
            let source = pipeline
                .transform_local(&path, &sanitized)
                .map_err(|err| RunError::Transform {
                    origin: path.to_string(),
                    reason: err.to_string(),
                })?;
            execute(ExecutionRequest {
                origin: script.origin.display_name().to_string(),
                source,
                review,
                // Local scripts have no repository to resolve imports
                // against; any relative import is a configuration error.
                resolver: Box::new(NoRemoteContext),
                budgets: input.budgets,
            })
        }
        PolicySource::Remote(reference) => {
            info!(policy = %reference, "running remote policy");
            let fetcher = RawContentFetcher::new(
                input.document.settings.raw_content_base.clone(),
                input.document.settings.access_token.clone(),
            )
            .map_err(|err| RunError::Load {
                origin: reference.clone(),
                reason: err.to_string(),
            })?;
            let resolver = RemoteResolver::new(Box::new(fetcher), pipeline);
            let root = resolver
                .resolve_root(&reference)
                .map_err(|err| RunError::Load {
                    origin: reference.clone(),
                    reason: err.to_string(),
                })?;
            execute(ExecutionRequest {
                origin: root.id,
                source: root.source,
                review,
                resolver: Box::new(resolver),
                budgets: input.budgets,
            })
        }
    }
}
