//! Python dependency installation.

use std::path::{Path, PathBuf};

use tutorbook_core::{CommandRunner, ToolCommand, TutorialMeta};

use crate::error::PublishResult;

/// Installs packages with `python -m pip install --quiet`.
pub struct DependencyInstaller<'a> {
    runner: &'a dyn CommandRunner,
    python: &'a str,
}

impl<'a> DependencyInstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner, python: &'a str) -> Self {
        Self { runner, python }
    }

    fn pip_install(&self) -> ToolCommand {
        ToolCommand::new(self.python).args(["-m", "pip", "install", "--quiet"])
    }

    /// Install every requirement manifest of `files` that exists under `root`.
    ///
    /// Returns the manifests that were installed.
    pub fn install_files(&self, root: &Path, files: &[PathBuf]) -> PublishResult<Vec<PathBuf>> {
        let present: Vec<PathBuf> = files
            .iter()
            .map(|f| root.join(f))
            .filter(|f| {
                let exists = f.is_file();
                if !exists {
                    tracing::debug!("No requirement manifest at {}", f.display());
                }
                exists
            })
            .collect();

        if present.is_empty() {
            tracing::info!("No requirement manifests to install");
            return Ok(present);
        }

        let mut command = self.pip_install();
        for file in &present {
            command = command.arg("-r").arg(file.to_string_lossy());
        }
        self.runner.run(&command.current_dir(root))?;
        Ok(present)
    }

    /// Install loose `pip` arguments. Does nothing when `args` is empty.
    pub fn install_packages(&self, args: &[String]) -> PublishResult<()> {
        if args.is_empty() {
            return Ok(());
        }
        self.runner.run(&self.pip_install().args(args.iter().cloned()))?;
        Ok(())
    }
}

/// Union of the `pip` arguments of several tutorials.
///
/// `--find-links` pairs come first, then requirements in first-seen order.
pub fn merged_pip_arguments<'m>(metas: impl IntoIterator<Item = &'m TutorialMeta>) -> Vec<String> {
    let mut links: Vec<&str> = Vec::new();
    let mut requirements: Vec<&str> = Vec::new();
    for meta in metas {
        for link in &meta.pip_find_links {
            if !links.contains(&link.as_str()) {
                links.push(link);
            }
        }
        for req in &meta.requirements {
            if !requirements.contains(&req.as_str()) {
                requirements.push(req);
            }
        }
    }

    let mut args = Vec::with_capacity(links.len() * 2 + requirements.len());
    for link in links {
        args.push("--find-links".to_string());
        args.push(link.to_string());
    }
    args.extend(requirements.into_iter().map(str::to_string));
    args
}
