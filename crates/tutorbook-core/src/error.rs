//! Error types for tutorbook-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for tutorbook-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tutorbook-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Metadata manifest could not be parsed.
    #[error("invalid metadata in {path}: {message}")]
    MetaParse { path: PathBuf, message: String },

    /// Metadata manifest is missing required fields.
    #[error("metadata in {path} is missing required fields: {}", fields.join(", "))]
    MetaMissingFields { path: PathBuf, fields: Vec<String> },

    /// No `.meta.yml` / `.meta.yaml` in a tutorial folder.
    #[error("no metadata manifest found in {0}")]
    MetaNotFound(PathBuf),

    /// Unknown accelerator name.
    #[error("unknown accelerator: {0}")]
    UnknownAccelerator(String),

    /// Folders that changed but carry no manifest.
    #[error("folders without a metadata manifest:\n{}", .0.join("\n"))]
    FoldersWithoutMeta(Vec<String>),

    /// Tutorial folder does not hold exactly one script.
    #[error("expected exactly one script in {path}, found {found}")]
    ScriptNotFound { path: PathBuf, found: usize },

    /// Git invocation failed.
    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    /// External tool invocation failed.
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// Required tool missing from PATH.
    #[error("required tool not found in PATH: {0}")]
    ToolNotFound(String),

    /// Invalid pipeline configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Recovery hint for errors the user can fix from the environment.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::ToolNotFound(_) => Some("install the tool or add it to PATH"),
            Error::MetaNotFound(_) | Error::FoldersWithoutMeta(_) => {
                Some("add a .meta.yml next to the tutorial script")
            }
            Error::MetaMissingFields { .. } => {
                Some("required fields: title, author, created, license, description, accelerator")
            }
            Error::Config(_) => Some("check the pipeline environment variables"),
            _ => None,
        }
    }

    /// Format the error followed by its hint, if any.
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{self}\n  hint: {hint}"),
            None => self.to_string(),
        }
    }
}
