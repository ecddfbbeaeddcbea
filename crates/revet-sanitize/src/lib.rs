//! Policy-script loading and DSL-import sanitization.
//!
//! The `revet` DSL is injected into the sandbox as capabilities, not
//! imported as a module, so the import statements script authors write for
//! editor support must be neutralized before execution. The sanitizer
//! replaces each such top-level statement with a comment of identical
//! length, preserving both line and column positions for error reporting.

#![forbid(unsafe_code)]

mod sanitize;

pub use sanitize::sanitize_dsl_imports;

use camino::{Utf8Path, Utf8PathBuf};
use revet_types::Dialect;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("policy script not found: {0}")]
    NotFound(Utf8PathBuf),
    #[error("could not read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

/// Where a policy script came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptOrigin {
    /// A file on local disk.
    Local(Utf8PathBuf),
    /// A canonical remote reference string (`owner/repo/path@branch`).
    Remote(String),
}

impl ScriptOrigin {
    pub fn display_name(&self) -> &str {
        match self {
            ScriptOrigin::Local(path) => path.as_str(),
            ScriptOrigin::Remote(reference) => reference.as_str(),
        }
    }
}

/// A loaded policy script: identity, raw text, inferred dialect.
/// Immutable once loaded; consumed once per run.
#[derive(Clone, Debug)]
pub struct PolicyScript {
    pub origin: ScriptOrigin,
    pub text: String,
    pub dialect: Dialect,
}

impl PolicyScript {
    /// Read a policy script from local disk, inferring its dialect from
    /// the file extension.
    pub fn load_local(path: &Utf8Path) -> Result<PolicyScript, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_owned())
            } else {
                LoadError::Io {
                    path: path.to_owned(),
                    source,
                }
            }
        })?;
        Ok(PolicyScript {
            origin: ScriptOrigin::Local(path.to_owned()),
            dialect: Dialect::from_path_or_default(path.as_str()),
            text,
        })
    }

    /// Wrap already-fetched remote content as a policy script. The dialect
    /// is passed in by the resolver, which already knows which candidate
    /// extension matched; the reference string may carry an `@branch`
    /// suffix, so it is not parsed for one here.
    pub fn from_remote(reference: String, dialect: Dialect, text: String) -> PolicyScript {
        PolicyScript {
            origin: ScriptOrigin::Remote(reference),
            dialect,
            text,
        }
    }

    /// The script text with DSL imports neutralized.
    pub fn sanitized_text(&self) -> String {
        sanitize_dsl_imports(&self.text)
    }
}
