use std::path::PathBuf;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while planning or running a metadata batch.
///
/// Only [`Error::Usage`] and [`Error::ToolUnavailable`] stop a run; every
/// other variant is recorded against the target it happened on and the batch
/// moves on. See [`Error::is_fatal`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed invocation (wrong number of path arguments).
    #[error("{0}")]
    Usage(String),

    /// An input file failed validation at time of use.
    #[error("{}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// The external tool could not be started at all.
    #[error("`{program}` is not available: {source}")]
    ToolUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external tool ran and reported a non-zero outcome.
    #[error("{0}")]
    ToolFailed(String),

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_path<T: ToString>(path: impl Into<PathBuf>, reason: T) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error aborts the whole batch rather than a single target.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::ToolUnavailable { .. })
    }
}
