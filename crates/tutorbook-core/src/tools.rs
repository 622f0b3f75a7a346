//! External tool invocation.
//!
//! The package installer, the notebook executor, `nvidia-smi` and `kaggle`
//! are all driven through [`CommandRunner`] so stages can be tested without
//! them installed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Lines of stderr kept in error messages.
const STDERR_TAIL: usize = 20;

/// A command line to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external tools.
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion. A non-zero exit is an [`Error::Tool`].
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;

    /// Locate a program in `PATH`.
    fn find(&self, program: &str) -> Option<PathBuf>;
}

/// [`CommandRunner`] that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        tracing::info!("Running: {}", command);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(command.env.iter().map(|(k, v)| (k, v)));

        let output = cmd.output().map_err(|e| Error::Tool {
            tool: command.program.clone(),
            message: format!("failed to start: {e}"),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        tracing::debug!("{} stdout:\n{}", command.program, stdout);

        if !output.status.success() {
            return Err(Error::Tool {
                tool: command.program.clone(),
                message: format!("{} ({})\n{}", command, output.status, tail(&stderr, STDERR_TAIL)),
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }

    fn find(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Last `n` lines of `text`.
fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
