use crate::error::PublishResult;
use crate::pipeline::{PipelineContext, PipelineStage, PipelineState, StageOutcome};

/// Confirms the publication branch exists on the remote and pins the source commit.
///
/// A missing publication branch ends the run successfully: there is nowhere
/// to publish to yet.
///
/// # Context Outputs
/// - `commit_hash`: `COMMIT_HASH`, or `HEAD` of the source checkout
/// - `source_branch`: `SOURCE_BRANCH`, or the checked-out branch
pub struct BranchCheckStage;

impl PipelineStage for BranchCheckStage {
    fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome> {
        let config = &context.config;
        let vcs = &context.toolbox.vcs;

        if !vcs.remote_branch_exists(&config.remote, &config.pub_branch)? {
            tracing::warn!(
                "Publication branch '{}' does not exist on '{}', nothing to publish",
                config.pub_branch,
                config.remote
            );
            return Ok(StageOutcome::Finish);
        }

        vcs.fetch(&config.remote)?;
        vcs.set_identity(&config.git_user_name, &config.git_user_email)?;

        let commit_hash = match &config.commit_hash {
            Some(hash) => hash.clone(),
            None => vcs.rev_parse("HEAD")?,
        };
        let source_branch = match &config.source_branch {
            Some(branch) => branch.clone(),
            None => vcs.current_branch()?,
        };

        tracing::info!("Publishing {} from '{}'", commit_hash, source_branch);
        if let Some(msg) = &config.commit_msg {
            tracing::debug!("Source commit message: {}", msg);
        }

        context.commit_hash = Some(commit_hash);
        context.source_branch = Some(source_branch);
        Ok(StageOutcome::Continue)
    }

    fn name(&self) -> &str {
        "branch-check"
    }

    fn target_state(&self) -> PipelineState {
        PipelineState::BranchChecked
    }
}
