use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use rayon::prelude::*;

use tutorbook_core::{Accelerator, ArtifactPaths, FailurePolicy, TutorialFolder, TutorialMeta};
use tutorbook_sync::generate_notebook;

use crate::environment::{InstalledPackages, installed_packages, record_environment};
use crate::error::{FolderFailure, PublishError, PublishResult};
use crate::install::{DependencyInstaller, merged_pip_arguments};
use crate::notebook::NotebookExecutor;
use crate::pipeline::{PipelineContext, PipelineStage, PipelineState, StageOutcome};

/// Artifacts produced for one tutorial folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFolder {
    pub folder: String,

    /// Paths relative to the repository root.
    pub artifacts: ArtifactPaths,
}

/// Everything needed to render a tutorial folder into its artifacts.
pub struct RenderJob<'a> {
    pub root: &'a Path,
    pub executor: &'a dyn NotebookExecutor,
    pub installed: &'a InstalledPackages,
    pub accelerator: Accelerator,
    pub commit: &'a str,
    pub rendered_at: &'a str,
}

impl RenderJob<'_> {
    /// Generate the notebook, execute it into `.notebooks/` and write the
    /// companion manifest with its `environment` block.
    pub fn render(&self, folder: &TutorialFolder) -> PublishResult<RenderedFolder> {
        let generated = generate_notebook(folder, self.rendered_at)?;
        let artifacts = ArtifactPaths::for_folder(&folder.rel_path);
        let target = artifacts.under(self.root);

        self.executor
            .execute(&generated.path, &target.notebook, &folder.dir)?;

        let mut meta = generated.meta;
        record_environment(
            &mut meta,
            self.installed,
            self.accelerator,
            self.commit,
            self.rendered_at,
        );
        meta.write_yaml(&target.meta)?;

        tracing::info!("Rendered {} → {}", folder.rel_path, artifacts.notebook.display());
        Ok(RenderedFolder {
            folder: folder.rel_path.clone(),
            artifacts,
        })
    }
}

/// Current time as shown in notebook headers and recorded environments.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Renders every changed tutorial and commits the artifacts once.
///
/// Runs only when at least one folder changed. Folders whose manifest does
/// not list the run's accelerator are skipped with a warning. Under
/// [`FailurePolicy::CollectAll`] every folder is attempted before the stage
/// fails; under [`FailurePolicy::FailFast`] the first failure stops it. A
/// failing stage commits nothing.
///
/// # Context Requirements
/// - `changes`, `commit_hash`
///
/// # Context Outputs
/// - `rendered`, `skipped`, and the publish commit in `commits`
pub struct RenderStage;

impl PipelineStage for RenderStage {
    fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome> {
        let changed = context.changes()?.changed.clone();
        let commit = context.commit_hash()?.to_string();
        let config = &context.config;
        let toolbox = &context.toolbox;
        let policy = config.failure_policy;

        let mut failures = Vec::new();
        let mut skipped = Vec::new();
        let mut targets: Vec<(TutorialFolder, TutorialMeta)> = Vec::new();

        for rel in &changed {
            let opened = TutorialFolder::open(&config.root, rel)
                .and_then(|folder| TutorialMeta::load(&folder.meta_path).map(|meta| (folder, meta)));
            match opened {
                Ok((_, meta)) if !meta.supports(config.accelerator) => {
                    tracing::warn!(
                        "Skipping {}: accelerator {} not in {:?}",
                        rel,
                        config.accelerator,
                        meta.accelerator
                    );
                    skipped.push(rel.clone());
                }
                Ok(target) => targets.push(target),
                Err(e) => failures.push(FolderFailure {
                    folder: rel.clone(),
                    message: e.to_string(),
                }),
            }
        }
        if policy == FailurePolicy::FailFast && !failures.is_empty() {
            failures.truncate(1);
            return Err(PublishError::FolderFailures(failures));
        }

        let runner = toolbox.runner.as_ref();
        DependencyInstaller::new(runner, &config.python)
            .install_packages(&merged_pip_arguments(targets.iter().map(|(_, meta)| meta)))?;
        let installed = installed_packages(runner, &config.python)?;

        let rendered_at = timestamp();
        let job = RenderJob {
            root: &config.root,
            executor: toolbox.executor.as_ref(),
            installed: &installed,
            accelerator: config.accelerator,
            commit: &commit,
            rendered_at: &rendered_at,
        };
        let folders: Vec<&TutorialFolder> = targets.iter().map(|(folder, _)| folder).collect();
        let outcomes = render_all(&job, &folders, config.render_jobs, policy)?;

        let mut rendered = Vec::new();
        for (folder, outcome) in outcomes {
            match outcome {
                Ok(done) => rendered.push(done),
                Err(e) => {
                    tracing::error!("{}: {}", folder, e);
                    failures.push(FolderFailure {
                        folder,
                        message: e.to_string(),
                    });
                }
            }
        }
        if !failures.is_empty() {
            if policy == FailurePolicy::FailFast {
                failures.truncate(1);
            }
            return Err(PublishError::FolderFailures(failures));
        }

        let paths: Vec<PathBuf> = rendered
            .iter()
            .flat_map(|r| r.artifacts.all().map(Path::to_path_buf))
            .collect();
        toolbox.vcs.add(&paths)?;

        let mut commits = Vec::new();
        if toolbox.vcs.has_staged_changes()? {
            let message = config.publish_message(&commit);
            toolbox.vcs.commit(&message)?;
            tracing::info!("Committed {} notebook(s): {}", rendered.len(), message);
            commits.push(message);
        } else {
            tracing::info!("Rendered artifacts are unchanged, nothing to commit");
        }

        context.rendered = rendered.into_iter().map(|r| r.folder).collect();
        context.skipped = skipped;
        context.commits.extend(commits);
        Ok(StageOutcome::Continue)
    }

    fn name(&self) -> &str {
        "render"
    }

    fn target_state(&self) -> PipelineState {
        PipelineState::Rendered
    }

    fn should_skip(&self, context: &PipelineContext) -> bool {
        context.variables.changed_folders == 0
    }
}

type FolderOutcome = (String, PublishResult<RenderedFolder>);

/// Render `folders` in order, or on a pool of `jobs` threads.
///
/// Sequential fail-fast rendering stops after the first failure. The pool
/// always finishes the folders it was given.
fn render_all(
    job: &RenderJob<'_>,
    folders: &[&TutorialFolder],
    jobs: usize,
    policy: FailurePolicy,
) -> PublishResult<Vec<FolderOutcome>> {
    if jobs <= 1 || folders.len() <= 1 {
        let mut outcomes = Vec::with_capacity(folders.len());
        for folder in folders {
            let outcome = job.render(folder);
            let failed = outcome.is_err();
            outcomes.push((folder.rel_path.clone(), outcome));
            if failed && policy == FailurePolicy::FailFast {
                break;
            }
        }
        return Ok(outcomes);
    }

    tracing::info!("Rendering {} notebooks on {} threads", folders.len(), jobs);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| PublishError::Environment(format!("failed to start render pool: {e}")))?;
    Ok(pool.install(|| {
        folders
            .par_iter()
            .map(|folder| (folder.rel_path.clone(), job.render(folder)))
            .collect()
    }))
}
