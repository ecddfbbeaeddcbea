//! Remote policy-module resolution.
//!
//! Turns `owner/repo/path@branch` references into executable source: fetch
//! the raw file from the hosting platform, comment out its DSL imports,
//! run it through the transformation pipeline, and hand the result to the
//! sandbox. Imports inside a fetched module resolve against that module's
//! repository and branch, so a remote ruleset can span several files
//! without every import repeating the slug.

#![forbid(unsafe_code)]

mod fetch;
mod reference;

pub use fetch::{FetchError, RawContentFetcher, RefFetcher};
pub use reference::{RefParseError, RemoteRef, DEFAULT_BRANCH};

use revet_runtime::{ModuleResolver, ResolveError, ResolvedModule};
use revet_sanitize::PolicyScript;
use revet_transform::TransformPipeline;
use revet_types::Dialect;
use tracing::debug;

/// Resolver serving a remote-originated policy run: the root script and
/// every transitive import come off the same fetcher and go through the
/// same sanitize/transform steps as a local policy file.
pub struct RemoteResolver {
    fetcher: Box<dyn RefFetcher>,
    pipeline: TransformPipeline,
}

impl RemoteResolver {
    pub fn new(fetcher: Box<dyn RefFetcher>, pipeline: TransformPipeline) -> RemoteResolver {
        RemoteResolver { fetcher, pipeline }
    }

    /// Resolve a top-level reference, which must spell out its repository
    /// slug. An extensionless path tries `.ts` before `.js`.
    pub fn resolve_root(&self, reference: &str) -> Result<ResolvedModule, ResolveError> {
        let parsed = RemoteRef::parse_root(reference)
            .map_err(|err| ResolveError::Fetch(err.to_string()))?;
        self.fetch_module(&parsed, Dialect::TypeScript)
    }

    fn fetch_module(
        &self,
        reference: &RemoteRef,
        preferred: Dialect,
    ) -> Result<ResolvedModule, ResolveError> {
        for candidate in reference.candidates(preferred) {
            let text = self
                .fetcher
                .fetch(&candidate)
                .map_err(|err| ResolveError::Fetch(err.to_string()))?;
            let Some(text) = text else {
                debug!(reference = %candidate, "candidate absent, trying next extension");
                continue;
            };

            let script =
                PolicyScript::from_remote(candidate.to_string(), candidate.dialect(), text);
            let source = self
                .pipeline
                .transform_remote(script.dialect, &script.sanitized_text())
                .map_err(|err| ResolveError::Transform(err.to_string()))?;
            return Ok(ResolvedModule {
                id: script.origin.display_name().to_string(),
                dialect: script.dialect,
                source,
            });
        }
        Err(ResolveError::NotFound)
    }
}

impl ModuleResolver for RemoteResolver {
    fn resolve(&self, specifier: &str, referrer: &str) -> Result<ResolvedModule, ResolveError> {
        let parent =
            RemoteRef::parse_root(referrer).map_err(|_| ResolveError::NoRepositoryContext)?;
        let target = parent
            .join(specifier)
            .map_err(|err| ResolveError::Fetch(err.to_string()))?;
        self.fetch_module(&target, parent.dialect())
    }
}
