use revet_types::Dialect;
use thiserror::Error;

/// A relative import, resolved to executable source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Canonical identity of the resolved file. Becomes the referrer for
    /// the module's own relative imports, so resolution recurses.
    pub id: String,
    pub dialect: Dialect,
    /// Sanitized, transformed source (no import/export syntax).
    pub source: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither candidate extension exists at the target location.
    #[error("not found after trying both candidate extensions")]
    NotFound,

    /// The import has no repository to resolve against (configuration
    /// error; fails fast rather than silently resolving to nothing).
    #[error("no repository context for relative import")]
    NoRepositoryContext,

    /// Transport or auth failure, distinct from a legitimately absent file.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The fetched module's source could not be transformed.
    #[error("transform failed: {0}")]
    Transform(String),
}

/// Resolver interface injected into the sandbox's `require` mechanism:
/// `(specifier, referrer) -> source`, recursively applied to whatever the
/// resolved module imports in turn.
pub trait ModuleResolver: Send {
    fn resolve(&self, specifier: &str, referrer: &str) -> Result<ResolvedModule, ResolveError>;
}

/// Resolver for locally-originated scripts, which have no repository
/// context: every relative import is a configuration error.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRemoteContext;

impl ModuleResolver for NoRemoteContext {
    fn resolve(&self, _specifier: &str, _referrer: &str) -> Result<ResolvedModule, ResolveError> {
        Err(ResolveError::NoRepositoryContext)
    }
}
