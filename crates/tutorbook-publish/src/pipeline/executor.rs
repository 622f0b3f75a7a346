use std::time::Instant;

use super::context::PipelineContext;
use super::core::{PipelineResult, PipelineStage, PipelineState, StageOutcome, StageResult};
use super::stages::{
    BranchCheckStage, DatasetStage, DetectStage, InstallStage, PruneStage, PublishStage,
    RenderStage, SanityCheckStage,
};
use crate::error::PublishResult;

/// Runs stages in order.
///
/// # Example
/// ```no_run
/// use tutorbook_core::PipelineConfig;
/// use tutorbook_publish::{Pipeline, PipelineContext, Toolbox};
///
/// # fn main() -> tutorbook_publish::PublishResult<()> {
/// let config = PipelineConfig::from_env(".")?;
/// let toolbox = Toolbox::system(&config)?;
/// let mut context = PipelineContext::new(config, toolbox);
/// let result = Pipeline::standard().execute(&mut context)?;
/// assert!(result.success);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    name: String,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    /// The full publishing run.
    pub fn standard() -> Self {
        Self::builder("publish")
            .add_stage(BranchCheckStage)
            .add_stage(InstallStage)
            .add_stage(SanityCheckStage)
            .add_stage(DetectStage)
            .add_stage(DatasetStage)
            .add_stage(RenderStage)
            .add_stage(PruneStage)
            .add_stage(PublishStage)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Execute the stages sequentially.
    ///
    /// A failing stage stops the run and yields a failed [`PipelineResult`];
    /// nothing after it executes. Skipped stages never run later.
    pub fn execute(&self, context: &mut PipelineContext) -> PublishResult<PipelineResult> {
        tracing::info!(
            "Starting pipeline '{}' with {} stages (run: {})",
            self.name,
            self.stages.len(),
            context.run_id()
        );

        let pipeline_start = Instant::now();
        let mut stage_results = Vec::new();

        for (index, stage) in self.stages.iter().enumerate() {
            let stage_name = stage.name();

            if stage.should_skip(context) {
                tracing::info!(
                    "Skipping stage {}/{}: {}",
                    index + 1,
                    self.stages.len(),
                    stage_name
                );
                stage_results.push(StageResult::skipped(stage_name));
                continue;
            }

            tracing::info!(
                "Executing stage {}/{}: {}",
                index + 1,
                self.stages.len(),
                stage_name
            );

            let stage_start = Instant::now();
            let outcome = stage.execute(context);
            let duration = stage_start.elapsed();

            match outcome {
                Ok(outcome) => {
                    context.state = stage.target_state();
                    tracing::info!(
                        "Stage '{}' completed in {:.2}s ({})",
                        stage_name,
                        duration.as_secs_f64(),
                        context.state
                    );
                    stage_results.push(StageResult::success(stage_name, duration));

                    if outcome == StageOutcome::Finish {
                        tracing::info!("Stage '{}' ended the run", stage_name);
                        return Ok(self.finish(context, stage_results, pipeline_start, true));
                    }
                }
                Err(e) => {
                    let error_msg = e.to_string();
                    tracing::error!("Stage '{}' failed: {}", stage_name, error_msg);
                    stage_results.push(StageResult::failure(
                        stage_name,
                        error_msg.clone(),
                        duration,
                    ));
                    return Ok(PipelineResult::failure(
                        &self.name,
                        stage_results,
                        error_msg,
                        pipeline_start.elapsed(),
                        context.state,
                    ));
                }
            }
        }

        Ok(self.finish(context, stage_results, pipeline_start, false))
    }

    fn finish(
        &self,
        context: &mut PipelineContext,
        stage_results: Vec<StageResult>,
        pipeline_start: Instant,
        exited_early: bool,
    ) -> PipelineResult {
        context.state = PipelineState::End;
        let total_duration = pipeline_start.elapsed();
        tracing::info!(
            "Pipeline '{}' completed in {:.2}s (run: {})",
            self.name,
            total_duration.as_secs_f64(),
            context.run_id()
        );
        PipelineResult::success(&self.name, stage_results, total_duration, exited_early)
    }
}

/// Builder for constructing pipelines
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn add_stage<S: PipelineStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn add_boxed_stage(mut self, stage: Box<dyn PipelineStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            name: self.name,
            stages: self.stages,
        }
    }
}
