use revet_types::Dialect;
use std::fmt;
use thiserror::Error;

/// Default branch when a reference carries no `@branch` suffix.
pub const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefParseError {
    /// Top-level references must carry an `owner/repo/` slug.
    #[error("reference '{0}' is missing the owner/repo prefix")]
    MissingSlug(String),

    #[error("reference '{0}' has an empty file path")]
    EmptyPath(String),

    #[error("reference '{0}' has an empty branch after '@'")]
    EmptyBranch(String),

    /// A `..` chain walked out of the repository root.
    #[error("relative import '{0}' escapes the repository root")]
    EscapesRepository(String),
}

/// A fully qualified remote module reference: `owner/repo/path@branch`.
///
/// Parsing is context-sensitive. A top-level reference must spell out the
/// repository slug; an import inside an already-resolved module inherits
/// its parent's slug and branch and may only override the branch.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteRef {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub branch: String,
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.owner, self.repo, self.path, self.branch
        )
    }
}

impl RemoteRef {
    /// Parse a top-level reference: `owner/repo/path[@branch]`.
    pub fn parse_root(reference: &str) -> Result<RemoteRef, RefParseError> {
        let (body, branch) = split_branch(reference)?;
        let mut segments = body.splitn(3, '/');
        let owner = segments.next().unwrap_or_default();
        let repo = segments.next().unwrap_or_default();
        let path = segments.next().unwrap_or_default();
        if owner.is_empty() || repo.is_empty() || path.is_empty() {
            if path.is_empty() && !owner.is_empty() && !repo.is_empty() {
                return Err(RefParseError::EmptyPath(reference.to_string()));
            }
            return Err(RefParseError::MissingSlug(reference.to_string()));
        }
        Ok(RemoteRef {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: normalize(path, reference)?,
            branch: branch.unwrap_or(DEFAULT_BRANCH).to_string(),
        })
    }

    /// Resolve an import found inside this module. Dot-prefixed specifiers
    /// resolve against this module's directory; any other path resolves
    /// from the repository root. The slug always carries over, the branch
    /// only when the specifier has no `@branch` of its own.
    pub fn join(&self, specifier: &str) -> Result<RemoteRef, RefParseError> {
        let (body, branch) = split_branch(specifier)?;
        let path = if body.starts_with("./") || body.starts_with("../") {
            let dir = match self.path.rsplit_once('/') {
                Some((dir, _)) => dir,
                None => "",
            };
            if dir.is_empty() {
                normalize(body, specifier)?
            } else {
                normalize(&format!("{dir}/{body}"), specifier)?
            }
        } else {
            normalize(body, specifier)?
        };
        Ok(RemoteRef {
            owner: self.owner.clone(),
            repo: self.repo.clone(),
            path,
            branch: branch.unwrap_or(&self.branch).to_string(),
        })
    }

    /// Dialect implied by the path's extension, defaulting to TypeScript.
    pub fn dialect(&self) -> Dialect {
        Dialect::from_path_or_default(&self.path)
    }

    /// Concrete fetch attempts for this reference, in priority order.
    ///
    /// An explicit `.ts`/`.js` extension pins a single candidate; an
    /// extensionless path tries both, starting with the dialect of the
    /// module that named it.
    pub fn candidates(&self, preferred: Dialect) -> Vec<RemoteRef> {
        let has_extension = self
            .path
            .rsplit_once('.')
            .is_some_and(|(_, ext)| Dialect::from_extension(ext).is_some());
        if has_extension {
            return vec![self.clone()];
        }
        preferred
            .candidate_extensions()
            .iter()
            .map(|ext| RemoteRef {
                path: format!("{}.{ext}", self.path),
                ..self.clone()
            })
            .collect()
    }
}

fn split_branch(reference: &str) -> Result<(&str, Option<&str>), RefParseError> {
    match reference.rsplit_once('@') {
        Some((_, "")) => Err(RefParseError::EmptyBranch(reference.to_string())),
        Some((body, branch)) => Ok((body, Some(branch))),
        None => Ok((reference, None)),
    }
}

/// Collapse `.` and `..` segments without ever leaving the repository root.
fn normalize(path: &str, original: &str) -> Result<String, RefParseError> {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if out.pop().is_none() {
                    return Err(RefParseError::EscapesRepository(original.to_string()));
                }
            }
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return Err(RefParseError::EmptyPath(original.to_string()));
    }
    Ok(out.join("/"))
}
