//! `render`: run one tutorial through generation, execution and recording.
//!
//! Unlike `run`, nothing is committed or pushed; the artifacts are left in
//! `.notebooks/` for inspection.

use std::path::Path;

use tutorbook_core::{PipelineConfig, TutorialFolder, TutorialMeta};
use tutorbook_publish::environment::installed_packages;
use tutorbook_publish::pipeline::stages::{RenderJob, timestamp};
use tutorbook_publish::{DependencyInstaller, Toolbox};

use crate::colors;

/// Render a single tutorial folder.
pub fn execute(root: &Path, folder: &str) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env(root)?;
    let toolbox = Toolbox::system(&config)?;
    let folder = TutorialFolder::open(root, folder)?;

    let meta = TutorialMeta::load(&folder.meta_path)?;
    if !meta.supports(config.accelerator) {
        println!(
            "{}Warning:{} {} does not list accelerator {}",
            colors::YELLOW,
            colors::RESET,
            folder.rel_path,
            config.accelerator
        );
    }

    let commit = match &config.commit_hash {
        Some(hash) => hash.clone(),
        None => toolbox.vcs.rev_parse("HEAD")?,
    };

    println!(
        "\n{}Rendering{} {} with {}",
        colors::BOLD,
        colors::RESET,
        folder.rel_path,
        toolbox.executor.name()
    );
    println!("{}", "─".repeat(50));

    for url in &meta.datasets.web {
        toolbox.fetcher.fetch_web(url, &config.datasets_dir)?;
    }
    for competition in &meta.datasets.kaggle {
        toolbox.fetcher.fetch_kaggle(competition, &config.datasets_dir)?;
    }

    let runner = toolbox.runner.as_ref();
    DependencyInstaller::new(runner, &config.python).install_packages(&meta.pip_arguments())?;
    let installed = installed_packages(runner, &config.python)?;

    let rendered_at = timestamp();
    let job = RenderJob {
        root,
        executor: toolbox.executor.as_ref(),
        installed: &installed,
        accelerator: config.accelerator,
        commit: &commit,
        rendered_at: &rendered_at,
    };
    let rendered = job.render(&folder)?;

    for artifact in rendered.artifacts.all() {
        println!("  {}✓{} {}", colors::GREEN, colors::RESET, artifact.display());
    }
    Ok(())
}
