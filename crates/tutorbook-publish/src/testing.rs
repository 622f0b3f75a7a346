//! In-memory stand-ins for the toolbox seams.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tutorbook_core::{
    CommandRunner, Error, PipelineConfig, Result, ToolCommand, ToolOutput, TutorialMeta, Vcs,
};

use crate::datasets::DatasetFetcher;
use crate::error::{PublishError, PublishResult};
use crate::notebook::NotebookExecutor;
use crate::pipeline::PipelineContext;
use crate::toolbox::Toolbox;

pub const BASE_META: &str = "title: Activation functions\nauthor: Phillip Lippe\ncreated: 2021-08-27\nlicense: CC BY-SA\ndescription: Closer look at activation functions.\n";

pub const SCRIPT: &str = "# %%\nimport torch\n\n# %% [markdown]\n# ## Done\n";

/// Parsed manifest with both accelerators plus `extra` YAML.
pub fn meta(extra: &str) -> TutorialMeta {
    let content = format!("{BASE_META}accelerator: [CPU, GPU]\n{extra}");
    TutorialMeta::parse(Path::new(".meta.yml"), &content).unwrap()
}

/// Write a tutorial folder with a manifest and one script.
///
/// Both accelerators are listed unless `extra` sets `accelerator` itself.
pub fn write_tutorial(root: &Path, rel: &str, extra: &str) {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    let accelerator = if extra.contains("accelerator") {
        ""
    } else {
        "accelerator: [CPU, GPU]\n"
    };
    fs::write(dir.join(".meta.yml"), format!("{BASE_META}{accelerator}{extra}")).unwrap();
    let stem = rel.rsplit('/').next().unwrap();
    fs::write(dir.join(format!("{stem}.py")), SCRIPT).unwrap();
}

// =============================================================================
// Vcs
// =============================================================================

pub struct VcsState {
    pub missing_branch: bool,
    pub head: String,
    pub branch: String,
    pub diff: Vec<String>,
    pub tree: Vec<String>,
    pub tracked: BTreeSet<PathBuf>,
    pub staged: bool,
    pub calls: Vec<String>,
    pub commits: Vec<String>,
    pub pushes: Vec<(String, String)>,
    pub fail_on: Option<&'static str>,
}

impl Default for VcsState {
    fn default() -> Self {
        Self {
            missing_branch: false,
            head: "abc123".to_string(),
            branch: "main".to_string(),
            diff: Vec::new(),
            tree: Vec::new(),
            tracked: BTreeSet::new(),
            staged: false,
            calls: Vec::new(),
            commits: Vec::new(),
            pushes: Vec::new(),
            fail_on: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeVcs {
    state: Arc<Mutex<VcsState>>,
}

impl FakeVcs {
    pub fn state(&self) -> MutexGuard<'_, VcsState> {
        self.state.lock().unwrap()
    }

    fn enter(&self, op: &'static str, call: String) -> Result<MutexGuard<'_, VcsState>> {
        let mut state = self.state();
        state.calls.push(call);
        if state.fail_on == Some(op) {
            return Err(Error::Git {
                command: op.to_string(),
                message: "simulated failure".to_string(),
            });
        }
        Ok(state)
    }
}

impl Vcs for FakeVcs {
    fn remote_branch_exists(&self, remote: &str, branch: &str) -> Result<bool> {
        let state = self.enter("ls-remote", format!("ls-remote {remote} {branch}"))?;
        Ok(!state.missing_branch)
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.enter("fetch", format!("fetch {remote}")).map(drop)
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        let state = self.enter("rev-parse", format!("rev-parse {rev}"))?;
        Ok(state.head.clone())
    }

    fn current_branch(&self) -> Result<String> {
        let state = self.enter("rev-parse", "rev-parse --abbrev-ref HEAD".to_string())?;
        Ok(state.branch.clone())
    }

    fn diff_names(&self, base: &str) -> Result<Vec<String>> {
        let state = self.enter("diff", format!("diff {base}"))?;
        Ok(state.diff.clone())
    }

    fn list_tree(&self, rev: &str, path: &str) -> Result<Vec<String>> {
        let state = self.enter("ls-tree", format!("ls-tree {rev} {path}"))?;
        Ok(state
            .tree
            .iter()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect())
    }

    fn checkout(&self, branch: &str, start_point: &str) -> Result<()> {
        self.enter("checkout", format!("checkout -B {branch} {start_point}"))
            .map(drop)
    }

    fn merge(&self, rev: &str) -> Result<()> {
        self.enter("merge", format!("merge {rev}")).map(drop)
    }

    fn add(&self, paths: &[PathBuf]) -> Result<()> {
        let mut state = self.enter("add", format!("add {}", paths.len()))?;
        for path in paths {
            state.tracked.insert(path.clone());
            state.staged = true;
        }
        Ok(())
    }

    fn remove(&self, paths: &[PathBuf]) -> Result<()> {
        let mut state = self.enter("rm", format!("rm {}", paths.len()))?;
        for path in paths {
            if state.tracked.remove(path) {
                state.staged = true;
            }
        }
        Ok(())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        Ok(self.state().staged)
    }

    fn commit(&self, message: &str) -> Result<()> {
        let mut state = self.enter("commit", format!("commit {message}"))?;
        if !state.staged {
            return Err(Error::Git {
                command: "commit".to_string(),
                message: "nothing to commit".to_string(),
            });
        }
        state.staged = false;
        state.commits.push(message.to_string());
        Ok(())
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let mut state = self.enter("push", format!("push {branch}"))?;
        state.pushes.push((remote.to_string(), branch.to_string()));
        Ok(())
    }

    fn set_identity(&self, name: &str, email: &str) -> Result<()> {
        self.enter("config", format!("config {name} <{email}>"))
            .map(drop)
    }
}

// =============================================================================
// CommandRunner
// =============================================================================

#[derive(Default)]
pub struct RunnerState {
    pub commands: Vec<ToolCommand>,
    pub failing: Vec<String>,
    pub missing: Vec<String>,
    pub stdout: Vec<(String, String)>,
    pub writes: Vec<PathBuf>,
}

#[derive(Clone, Default)]
pub struct FakeRunner {
    state: Arc<Mutex<RunnerState>>,
}

impl FakeRunner {
    pub fn state(&self) -> MutexGuard<'_, RunnerState> {
        self.state.lock().unwrap()
    }

    /// Fail every command whose line contains `pattern`.
    pub fn failing(self, pattern: &str) -> Self {
        self.state().failing.push(pattern.to_string());
        self
    }

    /// Report `program` as absent from `PATH`.
    pub fn missing(self, program: &str) -> Self {
        self.state().missing.push(program.to_string());
        self
    }

    /// Answer commands containing `pattern` with `stdout`.
    pub fn with_stdout(self, pattern: &str, stdout: &str) -> Self {
        self.state()
            .stdout
            .push((pattern.to_string(), stdout.to_string()));
        self
    }

    /// Create `path` whenever a command runs.
    pub fn writing(self, path: &Path) -> Self {
        self.state().writes.push(path.to_path_buf());
        self
    }

    pub fn commands(&self) -> Vec<ToolCommand> {
        self.state().commands.clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.state().commands.iter().map(ToString::to_string).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        let mut state = self.state();
        state.commands.push(command.clone());
        let line = command.to_string();

        if state.failing.iter().any(|p| line.contains(p.as_str())) {
            return Err(Error::Tool {
                tool: command.program.clone(),
                message: format!("{line} (exit status: 1)"),
            });
        }
        for path in &state.writes {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, "{}")?;
        }
        let stdout = state
            .stdout
            .iter()
            .find(|(p, _)| line.contains(p.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(ToolOutput {
            stdout,
            stderr: String::new(),
        })
    }

    fn find(&self, program: &str) -> Option<PathBuf> {
        let state = self.state();
        if state.missing.iter().any(|m| m == program) {
            None
        } else {
            Some(PathBuf::from("/usr/bin").join(program))
        }
    }
}

// =============================================================================
// NotebookExecutor
// =============================================================================

#[derive(Default)]
pub struct ExecutorState {
    pub executed: Vec<(PathBuf, PathBuf, PathBuf)>,
    pub failing: Vec<String>,
    pub broken: bool,
}

#[derive(Clone, Default)]
pub struct FakeExecutor {
    state: Arc<Mutex<ExecutorState>>,
}

impl FakeExecutor {
    pub fn state(&self) -> MutexGuard<'_, ExecutorState> {
        self.state.lock().unwrap()
    }

    /// Fail notebooks whose working directory ends with `folder`.
    pub fn failing(self, folder: &str) -> Self {
        self.state().failing.push(folder.to_string());
        self
    }

    pub fn executed_outputs(&self) -> Vec<PathBuf> {
        self.state()
            .executed
            .iter()
            .map(|(_, output, _)| output.clone())
            .collect()
    }
}

impl NotebookExecutor for FakeExecutor {
    fn name(&self) -> &str {
        "fake"
    }

    fn version(&self) -> PublishResult<String> {
        if self.state().broken {
            return Err(PublishError::Environment("executor is broken".to_string()));
        }
        Ok("0.0.1".to_string())
    }

    fn execute(&self, input: &Path, output: &Path, cwd: &Path) -> PublishResult<()> {
        let mut state = self.state();
        state
            .executed
            .push((input.to_path_buf(), output.to_path_buf(), cwd.to_path_buf()));
        if state.failing.iter().any(|f| cwd.ends_with(f)) {
            return Err(PublishError::Render {
                folder: cwd.display().to_string(),
                message: "kernel died".to_string(),
            });
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(input, output)?;
        Ok(())
    }
}

// =============================================================================
// DatasetFetcher
// =============================================================================

#[derive(Clone, Default)]
pub struct FakeFetcher {
    pub fetched: Arc<Mutex<Vec<String>>>,
}

impl FakeFetcher {
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl DatasetFetcher for FakeFetcher {
    fn fetch_web(&self, url: &str, dest_dir: &Path) -> PublishResult<PathBuf> {
        self.fetched.lock().unwrap().push(format!("web {url}"));
        Ok(dest_dir.join("web"))
    }

    fn fetch_kaggle(&self, competition: &str, dest_dir: &Path) -> PublishResult<PathBuf> {
        self.fetched
            .lock()
            .unwrap()
            .push(format!("kaggle {competition}"));
        Ok(dest_dir.join(competition))
    }
}

// =============================================================================
// Toolbox
// =============================================================================

/// Handles to every fake, shared with the toolbox they are installed in.
#[derive(Clone, Default)]
pub struct Fakes {
    pub vcs: FakeVcs,
    pub runner: FakeRunner,
    pub executor: FakeExecutor,
    pub fetcher: FakeFetcher,
}

impl Fakes {
    pub fn toolbox(&self) -> Toolbox {
        Toolbox {
            vcs: Box::new(self.vcs.clone()),
            runner: Arc::new(self.runner.clone()),
            executor: Box::new(self.executor.clone()),
            fetcher: Box::new(self.fetcher.clone()),
        }
    }

    /// Context over a repository at `root` with default settings.
    pub fn context(&self, root: impl AsRef<Path>) -> PipelineContext {
        self.context_with(PipelineConfig::new(root))
    }

    pub fn context_with(&self, config: PipelineConfig) -> PipelineContext {
        PipelineContext::new(config, self.toolbox())
    }
}
