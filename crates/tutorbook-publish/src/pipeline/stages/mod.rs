//! Stages of the standard publishing pipeline, in execution order.

mod branch;
mod datasets;
mod detect;
mod install;
mod prune;
mod publish;
mod render;
mod sanity;

pub use branch::BranchCheckStage;
pub use datasets::DatasetStage;
pub use detect::DetectStage;
pub use install::InstallStage;
pub use prune::PruneStage;
pub use publish::PublishStage;
pub use render::{RenderJob, RenderStage, RenderedFolder, timestamp};
pub use sanity::SanityCheckStage;

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;
    use tutorbook_core::{Accelerator, FolderChanges, PipelineConfig};

    use super::{DatasetStage, RenderStage};
    use crate::pipeline::{Pipeline, PipelineState};
    use crate::testing::{FakeExecutor, Fakes, SCRIPT, write_tutorial};

    const CHANGED: &str = "course_UvA-DL/02-activation-functions";
    const DROPPED: &str = "course_UvA-DL/99-removed";

    fn gpu_config(temp: &TempDir) -> PipelineConfig {
        let mut config = PipelineConfig::new(temp.path());
        config.accelerator = Accelerator::Gpu;
        config
    }

    /// Source tree with one edited tutorial and one removed since the last publication.
    fn scenario(temp: &TempDir) -> Fakes {
        write_tutorial(temp.path(), CHANGED, "");
        let fakes = Fakes::default();
        {
            let mut vcs = fakes.vcs.state();
            vcs.diff = vec![
                format!("{CHANGED}/02-activation-functions.py"),
                format!("{DROPPED}/99-removed.py"),
            ];
            vcs.tree = vec![
                format!(".notebooks/{CHANGED}.ipynb"),
                format!(".notebooks/{DROPPED}.ipynb"),
                format!(".notebooks/{DROPPED}.yaml"),
            ];
            vcs.tracked.insert(PathBuf::from(format!(".notebooks/{DROPPED}.ipynb")));
            vcs.tracked.insert(PathBuf::from(format!(".notebooks/{DROPPED}.yaml")));
        }
        fakes
    }

    #[test]
    fn test_publishes_changed_and_prunes_dropped() {
        let temp = TempDir::new().unwrap();
        let fakes = scenario(&temp);
        let mut context = fakes.context_with(gpu_config(&temp));

        let result = Pipeline::standard().execute(&mut context).unwrap();

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.executed_stages(), 8);
        assert_eq!(
            fakes.vcs.state().commits,
            vec!["publish [GPU]: abc123", "prune: abc123"]
        );
        assert!(temp.path().join(format!(".notebooks/{CHANGED}.ipynb")).is_file());
        assert!(temp.path().join(format!(".notebooks/{CHANGED}.yaml")).is_file());
        assert!(!fakes
            .vcs
            .state()
            .tracked
            .iter()
            .any(|p| p.to_string_lossy().contains(DROPPED)));
        assert_eq!(fakes.vcs.state().pushes.len(), 1);
        assert_eq!(context.state, PipelineState::End);
    }

    #[test]
    fn test_nothing_changed_pushes_without_commits() {
        let temp = TempDir::new().unwrap();
        let fakes = Fakes::default();
        let mut context = fakes.context_with(gpu_config(&temp));

        let result = Pipeline::standard().execute(&mut context).unwrap();

        assert!(result.success);
        assert_eq!(result.skipped_stages(), 2);
        assert!(!result.ran("render"));
        assert!(!result.ran("prune"));
        assert!(result.ran("publish"));
        assert!(fakes.vcs.state().commits.is_empty());
        assert_eq!(fakes.vcs.state().pushes.len(), 1);
    }

    #[test]
    fn test_missing_publication_branch_ends_quietly() {
        let temp = TempDir::new().unwrap();
        let fakes = scenario(&temp);
        fakes.vcs.state().missing_branch = true;
        let mut context = fakes.context_with(gpu_config(&temp));

        let result = Pipeline::standard().execute(&mut context).unwrap();

        assert!(result.success);
        assert!(result.exited_early);
        assert_eq!(result.executed_stages(), 1);
        assert!(fakes.vcs.state().pushes.is_empty());
        assert!(fakes.runner.command_lines().is_empty());
    }

    #[test]
    fn test_render_failure_halts_before_prune_and_push() {
        let temp = TempDir::new().unwrap();
        let fakes = Fakes {
            executor: FakeExecutor::default().failing(CHANGED),
            ..scenario(&temp)
        };
        let mut context = fakes.context_with(gpu_config(&temp));

        let result = Pipeline::standard().execute(&mut context).unwrap();

        assert!(!result.success);
        assert_eq!(result.failed_stage().unwrap().stage_name, "render");
        assert_eq!(result.final_state, PipelineState::DatasetsFetched);
        assert!(fakes.vcs.state().commits.is_empty());
        assert!(fakes.vcs.state().pushes.is_empty());
    }

    #[test]
    fn test_gpu_missing_fails_before_detection() {
        let temp = TempDir::new().unwrap();
        let fakes = Fakes {
            runner: crate::testing::FakeRunner::default().failing("nvidia-smi"),
            ..scenario(&temp)
        };
        let mut context = fakes.context_with(gpu_config(&temp));

        let result = Pipeline::standard().execute(&mut context).unwrap();

        assert!(!result.success);
        assert_eq!(result.failed_stage().unwrap().stage_name, "sanity-check");
        assert!(context.changes.is_none());
        assert!(!fakes.vcs.state().calls.iter().any(|c| c.starts_with("diff")));
    }

    #[test]
    fn test_invalid_manifest_fails_render_after_other_folders() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("course/a-bad");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join(".meta.yml"), "title: Incomplete\n").unwrap();
        fs::write(bad.join("a-bad.py"), SCRIPT).unwrap();
        write_tutorial(temp.path(), "course/b-good", "datasets:\n  kaggle: [titanic]\n");

        let fakes = Fakes::default();
        let mut context = fakes.context_with(gpu_config(&temp));
        context.commit_hash = Some("abc123".to_string());
        context.record_changes(FolderChanges {
            changed: vec!["course/a-bad".to_string(), "course/b-good".to_string()],
            dropped: Vec::new(),
        });
        let pipeline = Pipeline::builder("render")
            .add_stage(DatasetStage)
            .add_stage(RenderStage)
            .build();

        let result = pipeline.execute(&mut context).unwrap();

        assert!(!result.success);
        assert!(result.ran("datasets"));
        assert_eq!(result.failed_stage().unwrap().stage_name, "render");
        let error = result.error.unwrap();
        assert!(error.starts_with("1 tutorial(s) failed"), "{error}");
        assert!(error.contains("course/a-bad"), "{error}");
        assert_eq!(fakes.fetcher.fetched(), vec!["kaggle titanic"]);
        assert_eq!(fakes.executor.executed_outputs().len(), 1);
        assert!(fakes.vcs.state().commits.is_empty());
    }
}
