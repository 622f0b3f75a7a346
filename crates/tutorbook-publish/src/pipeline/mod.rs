//! Staged publishing pipeline.
//!
//! A run walks the states
//!
//! ```text
//! Start → BranchChecked → DependenciesInstalled → SanityChecked → DiffComputed
//!       → DatasetsFetched → Rendered? → Pruned? → Pushed → End
//! ```
//!
//! Stages marked `?` are skipped when their guard in [`PipelineVariables`]
//! is zero. Any stage error halts the run.

mod context;
mod core;
mod executor;
pub mod stages;

pub use context::{PipelineContext, PipelineVariables};
pub use self::core::{PipelineResult, PipelineStage, PipelineState, StageOutcome, StageResult};
pub use executor::{Pipeline, PipelineBuilder};
