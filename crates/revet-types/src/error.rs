use thiserror::Error;

/// Fatal run errors.
///
/// A judgment never aborts a run; every variant here does. "The policy
/// script is broken" must stay distinguishable from "the reviewed change
/// failed a check", so none of these are ever folded into a [`crate::RunResult`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The script file or remote reference could not be found or fetched.
    #[error("could not load policy script '{origin}': {reason}")]
    Load { origin: String, reason: String },

    /// The dialect compiler/transformer rejected the source.
    #[error("could not transform '{origin}': {reason}")]
    Transform { origin: String, reason: String },

    /// Uncaught synchronous exception, or the synchronous-phase budget
    /// was exceeded. Tasks registered before the abort are discarded.
    #[error("policy script execution failed: {reason}")]
    Execution { reason: String },

    /// A scheduled task rejected, or its completion signal never fired
    /// within the await-phase budget.
    #[error("scheduled task failed: {reason}")]
    ScheduledTask { reason: String },

    /// A relative import could not be resolved from its remote origin.
    #[error("could not resolve import '{specifier}' from '{referrer}': {reason}")]
    RemoteResolution {
        specifier: String,
        referrer: String,
        reason: String,
    },
}

impl RunError {
    pub fn kind(&self) -> RunErrorKind {
        match self {
            RunError::Load { .. } => RunErrorKind::Load,
            RunError::Transform { .. } => RunErrorKind::Transform,
            RunError::Execution { .. } => RunErrorKind::Execution,
            RunError::ScheduledTask { .. } => RunErrorKind::ScheduledTask,
            RunError::RemoteResolution { .. } => RunErrorKind::RemoteResolution,
        }
    }
}

/// Discriminant of [`RunError`], for reporting and exit-code mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunErrorKind {
    Load,
    Transform,
    Execution,
    ScheduledTask,
    RemoteResolution,
}

impl RunErrorKind {
    /// Stable lower-case label for error lines and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            RunErrorKind::Load => "load",
            RunErrorKind::Transform => "transform",
            RunErrorKind::Execution => "execution",
            RunErrorKind::ScheduledTask => "scheduled-task",
            RunErrorKind::RemoteResolution => "remote-resolution",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_resolution_message_names_specifier_and_referrer() {
        let err = RunError::RemoteResolution {
            specifier: "./b".to_string(),
            referrer: "org/repo/dir/a.ts@main".to_string(),
            reason: "not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'./b'"));
        assert!(msg.contains("'org/repo/dir/a.ts@main'"));
        assert_eq!(err.kind(), RunErrorKind::RemoteResolution);
        assert_eq!(err.kind().as_str(), "remote-resolution");
    }
}
