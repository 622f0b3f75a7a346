//! Notebook execution.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tutorbook_core::{CommandRunner, ToolCommand};

use crate::error::{PublishError, PublishResult};

/// Runs a generated notebook and stores the executed copy.
pub trait NotebookExecutor: Send + Sync {
    /// Executor name shown in logs.
    fn name(&self) -> &str;

    /// Version string reported by the executor; fails when it is unusable.
    fn version(&self) -> PublishResult<String>;

    /// Execute `input` with `cwd` as working directory and write the result to `output`.
    fn execute(&self, input: &Path, output: &Path, cwd: &Path) -> PublishResult<()>;
}

/// [`NotebookExecutor`] backed by `python -m papermill`.
///
/// Notebooks see the dataset directory through `PATH_DATASETS`.
pub struct PapermillExecutor {
    python: String,
    datasets_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl PapermillExecutor {
    pub fn new(
        python: impl Into<String>,
        datasets_dir: impl AsRef<Path>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            python: python.into(),
            datasets_dir: datasets_dir.as_ref().to_path_buf(),
            runner,
        }
    }

    fn command(&self) -> ToolCommand {
        ToolCommand::new(&self.python).args(["-m", "papermill"])
    }
}

impl NotebookExecutor for PapermillExecutor {
    fn name(&self) -> &str {
        "papermill"
    }

    fn version(&self) -> PublishResult<String> {
        let output = self.runner.run(&self.command().arg("--version"))?;
        Ok(output.stdout.trim().to_string())
    }

    fn execute(&self, input: &Path, output: &Path, cwd: &Path) -> PublishResult<()> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        // A previous render must not pass for this one.
        if output.is_file() {
            fs::remove_file(output)?;
        }

        let command = self
            .command()
            .arg(input.to_string_lossy())
            .arg(output.to_string_lossy())
            .arg("--cwd")
            .arg(cwd.to_string_lossy())
            .env("PATH_DATASETS", self.datasets_dir.to_string_lossy());
        self.runner.run(&command)?;

        if !output.is_file() {
            return Err(PublishError::Render {
                folder: cwd.display().to_string(),
                message: format!("{} produced no notebook at {}", self.name(), output.display()),
            });
        }
        Ok(())
    }
}
