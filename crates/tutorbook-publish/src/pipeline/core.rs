use std::fmt;
use std::time::Duration;

use super::context::PipelineContext;
use crate::error::PublishResult;

/// Where a run stands. Each stage moves the run to its target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    BranchChecked,
    DependenciesInstalled,
    SanityChecked,
    DiffComputed,
    DatasetsFetched,
    Rendered,
    Pruned,
    Pushed,
    End,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Start => "start",
            PipelineState::BranchChecked => "branch-checked",
            PipelineState::DependenciesInstalled => "dependencies-installed",
            PipelineState::SanityChecked => "sanity-checked",
            PipelineState::DiffComputed => "diff-computed",
            PipelineState::DatasetsFetched => "datasets-fetched",
            PipelineState::Rendered => "rendered",
            PipelineState::Pruned => "pruned",
            PipelineState::Pushed => "pushed",
            PipelineState::End => "end",
        };
        f.write_str(name)
    }
}

/// What the runner does after a stage succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Move on to the next stage.
    Continue,
    /// Stop here and end the run successfully.
    Finish,
}

/// A single step of the publishing pipeline.
///
/// # Example
/// ```
/// use tutorbook_publish::{PipelineContext, PipelineStage, PipelineState, PublishResult, StageOutcome};
///
/// struct Announce;
///
/// impl PipelineStage for Announce {
///     fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome> {
///         tracing::info!("run {}", context.run_id());
///         Ok(StageOutcome::Continue)
///     }
///
///     fn name(&self) -> &str {
///         "announce"
///     }
///
///     fn target_state(&self) -> PipelineState {
///         PipelineState::Start
///     }
/// }
/// ```
pub trait PipelineStage: Send + Sync {
    /// Run the stage. An error halts the pipeline.
    fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome>;

    /// Stage name for logs and results.
    fn name(&self) -> &str;

    /// State reached once the stage succeeds.
    fn target_state(&self) -> PipelineState;

    /// Whether the stage's guard is false for this run.
    fn should_skip(&self, _context: &PipelineContext) -> bool {
        false
    }
}

/// Result of a pipeline stage execution
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage_name: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration: Duration,
    pub skipped: bool,
}

impl StageResult {
    pub fn success(stage_name: impl Into<String>, duration: Duration) -> Self {
        Self {
            stage_name: stage_name.into(),
            success: true,
            error: None,
            duration,
            skipped: false,
        }
    }

    pub fn failure(
        stage_name: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            stage_name: stage_name.into(),
            success: false,
            error: Some(error.into()),
            duration,
            skipped: false,
        }
    }

    pub fn skipped(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            success: true,
            error: None,
            duration: Duration::ZERO,
            skipped: true,
        }
    }
}

/// Result of a complete pipeline execution
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub pipeline_name: String,
    pub success: bool,
    pub stage_results: Vec<StageResult>,
    pub total_duration: Duration,
    pub error: Option<String>,

    /// Last state reached.
    pub final_state: PipelineState,

    /// A stage ended the run before the last stage.
    pub exited_early: bool,
}

impl PipelineResult {
    pub fn success(
        pipeline_name: impl Into<String>,
        stage_results: Vec<StageResult>,
        total_duration: Duration,
        exited_early: bool,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            success: true,
            stage_results,
            total_duration,
            error: None,
            final_state: PipelineState::End,
            exited_early,
        }
    }

    pub fn failure(
        pipeline_name: impl Into<String>,
        stage_results: Vec<StageResult>,
        error: impl Into<String>,
        total_duration: Duration,
        final_state: PipelineState,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            success: false,
            stage_results,
            total_duration,
            error: Some(error.into()),
            final_state,
            exited_early: false,
        }
    }

    /// Number of stages that ran (not skipped).
    pub fn executed_stages(&self) -> usize {
        self.stage_results.iter().filter(|r| !r.skipped).count()
    }

    /// Number of stages skipped by their guard.
    pub fn skipped_stages(&self) -> usize {
        self.stage_results.iter().filter(|r| r.skipped).count()
    }

    pub fn failed_stage(&self) -> Option<&StageResult> {
        self.stage_results.iter().find(|r| !r.success)
    }

    /// Whether the named stage ran to completion.
    pub fn ran(&self, stage_name: &str) -> bool {
        self.stage_results
            .iter()
            .any(|r| r.stage_name == stage_name && r.success && !r.skipped)
    }
}
