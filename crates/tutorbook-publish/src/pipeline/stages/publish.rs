use crate::error::PublishResult;
use crate::pipeline::{PipelineContext, PipelineStage, PipelineState, StageOutcome};
use crate::remote::{push_target, redact};

/// Pushes the publication branch. Always runs, last.
pub struct PublishStage;

impl PipelineStage for PublishStage {
    fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome> {
        let config = &context.config;
        let target = push_target(config);

        tracing::info!(
            "Pushing '{}' to {} ({} new commit(s))",
            config.pub_branch,
            redact(&target),
            context.commits.len()
        );
        context.toolbox.vcs.push(&target, &config.pub_branch)?;

        context.pushed = true;
        Ok(StageOutcome::Continue)
    }

    fn name(&self) -> &str {
        "publish"
    }

    fn target_state(&self) -> PipelineState {
        PipelineState::Pushed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fakes;
    use tutorbook_core::PipelineConfig;

    #[test]
    fn test_pushes_publication_branch() {
        let fakes = Fakes::default();
        let mut context = fakes.context("/repo");

        PublishStage.execute(&mut context).unwrap();

        assert!(context.pushed);
        assert_eq!(
            fakes.vcs.state().pushes,
            vec![("origin".to_string(), "publication".to_string())]
        );
    }

    #[test]
    fn test_pushes_with_token() {
        let fakes = Fakes::default();
        let mut config = PipelineConfig::new("/repo");
        config.remote_url = Some("https://github.com/org/tutorials.git".to_string());
        config.token = Some("tok".to_string());
        config.pub_branch = "pub".to_string();
        let mut context = fakes.context_with(config);

        PublishStage.execute(&mut context).unwrap();

        assert_eq!(
            fakes.vcs.state().pushes[0],
            (
                "https://tok@github.com/org/tutorials.git".to_string(),
                "pub".to_string()
            )
        );
    }

    #[test]
    fn test_push_failure_propagates() {
        let fakes = Fakes::default();
        fakes.vcs.state().fail_on = Some("push");
        let mut context = fakes.context("/repo");

        assert!(PublishStage.execute(&mut context).is_err());
        assert!(!context.pushed);
    }
}
