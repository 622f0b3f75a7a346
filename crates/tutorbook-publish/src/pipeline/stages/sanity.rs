use tutorbook_core::{Accelerator, ToolCommand};

use crate::error::{PublishError, PublishResult};
use crate::pipeline::{PipelineContext, PipelineStage, PipelineState, StageOutcome};

/// Program that proves a GPU is attached.
const GPU_PROBE: &str = "nvidia-smi";

/// Verifies the render environment before any folder is touched.
///
/// Checks that the interpreter is on `PATH`, that the notebook executor
/// answers, and on GPU runs that `nvidia-smi` succeeds.
pub struct SanityCheckStage;

impl PipelineStage for SanityCheckStage {
    fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome> {
        let config = &context.config;
        let toolbox = &context.toolbox;

        let python = toolbox.runner.find(&config.python).ok_or_else(|| {
            PublishError::Environment(format!("'{}' was not found in PATH", config.python))
        })?;
        tracing::debug!("Using interpreter {}", python.display());

        let version = toolbox.executor.version().map_err(|e| {
            PublishError::Environment(format!("{} is not usable: {e}", toolbox.executor.name()))
        })?;
        tracing::info!("{} {}", toolbox.executor.name(), version);

        if config.accelerator == Accelerator::Gpu {
            if toolbox.runner.find(GPU_PROBE).is_none() {
                return Err(PublishError::Environment(format!(
                    "ACCELERATOR=GPU but {GPU_PROBE} was not found"
                )));
            }
            let output = toolbox
                .runner
                .run(&ToolCommand::new(GPU_PROBE))
                .map_err(|e| {
                    PublishError::Environment(format!("ACCELERATOR=GPU but no GPU is available: {e}"))
                })?;
            tracing::debug!("{}", output.stdout);
        }

        Ok(StageOutcome::Continue)
    }

    fn name(&self) -> &str {
        "sanity-check"
    }

    fn target_state(&self) -> PipelineState {
        PipelineState::SanityChecked
    }
}
