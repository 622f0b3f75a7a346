//! Error types for the publishing pipeline.

use std::fmt;

/// Result type for pipeline operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// A tutorial folder that failed to generate or render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderFailure {
    pub folder: String,
    pub message: String,
}

impl fmt::Display for FolderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.folder, self.message)
    }
}

/// Errors raised by pipeline stages.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Core error (git, tools, manifests).
    #[error(transparent)]
    Core(#[from] tutorbook_core::Error),

    /// Notebook generation error.
    #[error(transparent)]
    Sync(#[from] tutorbook_sync::SyncError),

    /// One or more tutorials failed; nothing was committed.
    #[error("{} tutorial(s) failed:\n{}", .0.len(), .0.iter().map(|f| format!("  {f}")).collect::<Vec<_>>().join("\n"))]
    FolderFailures(Vec<FolderFailure>),

    /// Rendered notebook is unusable.
    #[error("render of {folder} failed: {message}")]
    Render { folder: String, message: String },

    /// Sanity check failed.
    #[error("environment check failed: {0}")]
    Environment(String),

    /// Dataset download failed.
    #[error("failed to download {url}: {message}")]
    Download { url: String, message: String },

    /// A stage needed output of an earlier stage that is missing.
    #[error("pipeline context: {0}")]
    Context(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
