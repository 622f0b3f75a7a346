use crate::error::PublishResult;
use crate::install::DependencyInstaller;
use crate::pipeline::{PipelineContext, PipelineStage, PipelineState, StageOutcome};

/// Installs the repository-wide requirement manifests.
///
/// Per-tutorial requirements are installed by the render stage, once the
/// changed folders are known.
pub struct InstallStage;

impl PipelineStage for InstallStage {
    fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome> {
        let config = &context.config;
        let installed = DependencyInstaller::new(context.toolbox.runner.as_ref(), &config.python)
            .install_files(&config.root, &config.requirement_files)?;
        tracing::info!("Installed {} requirement manifest(s)", installed.len());
        Ok(StageOutcome::Continue)
    }

    fn name(&self) -> &str {
        "install"
    }

    fn target_state(&self) -> PipelineState {
        PipelineState::DependenciesInstalled
    }
}
