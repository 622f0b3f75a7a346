use std::path::{Path, PathBuf};

use tutorbook_core::ArtifactPaths;

use crate::error::PublishResult;
use crate::pipeline::{PipelineContext, PipelineStage, PipelineState, StageOutcome};

/// Removes the published artifacts of dropped tutorials.
///
/// Runs only when at least one folder was dropped. Removing artifacts that
/// are already gone is not an error, and when nothing ends up staged no
/// commit is made.
pub struct PruneStage;

impl PipelineStage for PruneStage {
    fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome> {
        let commit = context.commit_hash()?.to_string();
        let dropped = &context.changes()?.dropped;
        let vcs = &context.toolbox.vcs;

        let paths: Vec<PathBuf> = dropped
            .iter()
            .flat_map(|folder| {
                ArtifactPaths::for_folder(folder)
                    .all()
                    .map(Path::to_path_buf)
            })
            .collect();
        vcs.remove(&paths)?;

        if !vcs.has_staged_changes()? {
            tracing::info!("Artifacts of {} dropped folder(s) already absent", dropped.len());
            return Ok(StageOutcome::Continue);
        }

        let message = context.config.prune_message(&commit);
        vcs.commit(&message)?;
        tracing::info!("Pruned {} folder(s): {}", dropped.len(), message);
        context.commits.push(message);
        Ok(StageOutcome::Continue)
    }

    fn name(&self) -> &str {
        "prune"
    }

    fn target_state(&self) -> PipelineState {
        PipelineState::Pruned
    }

    fn should_skip(&self, context: &PipelineContext) -> bool {
        context.variables.dropped_folders == 0
    }
}
