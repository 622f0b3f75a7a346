use tutorbook_core::folders::published_folders;
use tutorbook_core::paths::PUBLISH_DIR;
use tutorbook_core::{ChangeDetector, FolderInventory, list_tutorial_folders};

use crate::error::PublishResult;
use crate::pipeline::{PipelineContext, PipelineStage, PipelineState, StageOutcome};

/// Works out which tutorials changed, then moves onto the publication branch.
///
/// The diff runs between the publication branch and the source checkout. The
/// changed and dropped lists are written to the repository root. The
/// publication branch is then checked out and the source commit merged into
/// it, so later stages work on a tree holding both the sources and the
/// published artifacts.
///
/// # Context Requirements
/// - `commit_hash` (set by the branch check)
///
/// # Context Outputs
/// - `changes` and the `variables` guards
pub struct DetectStage;

impl PipelineStage for DetectStage {
    fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome> {
        let config = &context.config;
        let vcs = &context.toolbox.vcs;
        let commit_hash = context.commit_hash()?.to_string();
        let pub_ref = config.pub_ref();

        let diff_paths = vcs.diff_names(&pub_ref)?;
        tracing::debug!("{} paths differ from {}", diff_paths.len(), pub_ref);

        let published_tree = vcs.list_tree(&pub_ref, PUBLISH_DIR)?;
        let inventory = FolderInventory::new(
            list_tutorial_folders(&config.root)?,
            published_folders(published_tree.iter().map(String::as_str)),
        );

        let changes = ChangeDetector::new(&config.root)
            .strict(config.strict)
            .detect(&inventory, &diff_paths)?;
        let (changed_file, dropped_file) = changes.write_to(&config.root)?;
        tracing::info!(
            "Changed: {} ({}), dropped: {} ({})",
            changes.changed.len(),
            changed_file.display(),
            changes.dropped.len(),
            dropped_file.display()
        );

        vcs.checkout(&config.pub_branch, &pub_ref)?;
        vcs.merge(&commit_hash)?;

        context.record_changes(changes);
        Ok(StageOutcome::Continue)
    }

    fn name(&self) -> &str {
        "detect"
    }

    fn target_state(&self) -> PipelineState {
        PipelineState::DiffComputed
    }
}
