//! Core model for tutorbook.
//!
//! This crate provides:
//! - Tutorial metadata manifests and validation
//! - Tutorial folder discovery and the publication layout
//! - Change detection between source and publication branches
//! - Pipeline configuration read from CI variables
//! - Seams over git and external tools

pub mod config;
pub mod diff;
pub mod error;
pub mod folders;
pub mod git;
pub mod meta;
pub mod paths;
pub mod tools;

pub use config::{FailurePolicy, PipelineConfig};
pub use diff::{ChangeDetector, FolderChanges, FolderInventory, read_folder_list, write_folder_list};
pub use error::{Error, Result};
pub use folders::{TutorialFolder, list_published_folders, list_tutorial_folders};
pub use git::{GitCli, Vcs};
pub use meta::{Accelerator, DatasetRefs, TutorialMeta};
pub use paths::ArtifactPaths;
pub use tools::{CommandRunner, ProcessRunner, ToolCommand, ToolOutput};
