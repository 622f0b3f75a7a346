//! Publishing pipeline for tutorbook.
//!
//! Detects which tutorial folders changed since the last publication,
//! renders them into notebooks on the publication branch, prunes the
//! artifacts of removed folders and pushes the result.
//!
//! # Architecture
//!
//! ```text
//! Start ─► BranchCheck ─► Install ─► SanityCheck ─► Detect ─► Datasets
//!                                                               │
//!        End ◄─ Publish ◄─ Prune? ◄─ Render? ◄──────────────────┘
//! ```
//!
//! Every stage implements [`PipelineStage`] and talks to the outside world
//! only through the [`Toolbox`] seams: [`Vcs`](tutorbook_core::Vcs),
//! [`CommandRunner`](tutorbook_core::CommandRunner), [`NotebookExecutor`]
//! and [`DatasetFetcher`].

pub mod datasets;
pub mod environment;
mod error;
pub mod install;
pub mod notebook;
pub mod pipeline;
pub mod remote;
mod toolbox;

#[cfg(test)]
pub(crate) mod testing;

pub use datasets::{DatasetFetcher, HttpFetcher};
pub use error::{FolderFailure, PublishError, PublishResult};
pub use install::DependencyInstaller;
pub use notebook::{NotebookExecutor, PapermillExecutor};
pub use pipeline::{
    Pipeline, PipelineBuilder, PipelineContext, PipelineResult, PipelineStage, PipelineState,
    PipelineVariables, StageOutcome, StageResult,
};
pub use toolbox::Toolbox;
