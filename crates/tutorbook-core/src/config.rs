//! Pipeline configuration.
//!
//! The CI agent passes pipeline variables through the environment. They are
//! read once, at pipeline start, into a [`PipelineConfig`] that every stage
//! receives.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::meta::Accelerator;
use crate::paths::default_datasets_dir;

/// What to do when a tutorial fails to generate or render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Try every folder, then fail with all errors.
    #[default]
    CollectAll,
    /// Stop at the first failing folder.
    FailFast,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collect" | "collect-all" => Ok(FailurePolicy::CollectAll),
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            other => Err(Error::Config(format!("unknown failure policy: {other}"))),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::CollectAll => f.write_str("collect"),
            FailurePolicy::FailFast => f.write_str("fail-fast"),
        }
    }
}

/// Settings shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Repository working tree.
    pub root: PathBuf,

    /// Hardware this run renders on (`ACCELERATOR`, GPU when unset).
    pub accelerator: Accelerator,

    /// Publication branch (`PUB_BRANCH`).
    pub pub_branch: String,

    /// Source branch (`SOURCE_BRANCH`); the checked-out branch when unset.
    pub source_branch: Option<String>,

    /// Remote holding the publication branch (`PUB_REMOTE`).
    pub remote: String,

    /// Push URL (`PUB_REMOTE_URL`); the remote itself when unset.
    pub remote_url: Option<String>,

    /// Token injected into an http(s) push URL (`PUB_TOKEN`).
    pub token: Option<String>,

    /// Dataset download directory (`PATH_DATASETS`).
    pub datasets_dir: PathBuf,

    /// Message of the triggering commit (`COMMIT_MSG`).
    pub commit_msg: Option<String>,

    /// Hash of the triggering commit (`COMMIT_HASH`); `HEAD` when unset.
    pub commit_hash: Option<String>,

    /// Committer name (`GIT_USER_NAME`).
    pub git_user_name: String,

    /// Committer email (`GIT_USER_EMAIL`).
    pub git_user_email: String,

    /// Python interpreter used for pip and the notebook executor (`PYTHON`).
    pub python: String,

    /// Repository-wide requirement manifests, relative to `root`.
    pub requirement_files: Vec<PathBuf>,

    /// Notebooks rendered concurrently (`RENDER_JOBS`).
    pub render_jobs: usize,

    /// Per-folder failure handling (`FAILURE_POLICY`).
    pub failure_policy: FailurePolicy,

    /// Fail when a touched folder has no manifest.
    pub strict: bool,
}

impl PipelineConfig {
    /// Defaults for a repository at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            accelerator: Accelerator::Gpu,
            pub_branch: "publication".to_string(),
            source_branch: None,
            remote: "origin".to_string(),
            remote_url: None,
            token: None,
            datasets_dir: default_datasets_dir(),
            commit_msg: None,
            commit_hash: None,
            git_user_name: "tutorbook".to_string(),
            git_user_email: "tutorbook@users.noreply.github.com".to_string(),
            python: "python".to_string(),
            requirement_files: vec![
                PathBuf::from("requirements.txt"),
                PathBuf::from("_requirements").join("data.txt"),
            ],
            render_jobs: 1,
            failure_policy: FailurePolicy::default(),
            strict: true,
        }
    }

    /// Read pipeline variables from the process environment.
    pub fn from_env(root: impl AsRef<Path>) -> Result<Self> {
        Self::from_lookup(root, |key| std::env::var(key).ok())
    }

    /// Read pipeline variables through `lookup`. Empty values count as unset.
    pub fn from_lookup(
        root: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::new(root);

        if let Some(acc) = get("ACCELERATOR") {
            config.accelerator = acc
                .parse()
                .map_err(|_| Error::Config(format!("ACCELERATOR must be CPU or GPU, got {acc}")))?;
        }
        if let Some(branch) = get("PUB_BRANCH") {
            config.pub_branch = branch;
        }
        config.source_branch = get("SOURCE_BRANCH").map(|b| strip_ref_prefix(&b).to_string());
        if let Some(remote) = get("PUB_REMOTE") {
            config.remote = remote;
        }
        config.remote_url = get("PUB_REMOTE_URL");
        config.token = get("PUB_TOKEN");
        if let Some(dir) = get("PATH_DATASETS") {
            config.datasets_dir = PathBuf::from(dir);
        }
        config.commit_msg = get("COMMIT_MSG");
        config.commit_hash = get("COMMIT_HASH");
        if let Some(name) = get("GIT_USER_NAME") {
            config.git_user_name = name;
        }
        if let Some(email) = get("GIT_USER_EMAIL") {
            config.git_user_email = email;
        }
        if let Some(python) = get("PYTHON") {
            config.python = python;
        }
        if let Some(jobs) = get("RENDER_JOBS") {
            config.render_jobs = jobs
                .parse::<usize>()
                .ok()
                .filter(|j| *j > 0)
                .ok_or_else(|| Error::Config(format!("RENDER_JOBS must be a positive number, got {jobs}")))?;
        }
        if let Some(policy) = get("FAILURE_POLICY") {
            config.failure_policy = policy.parse()?;
        }

        Ok(config)
    }

    /// Message of the render commit: `publish [<ACCELERATOR>]: <hash>`.
    pub fn publish_message(&self, commit_hash: &str) -> String {
        format!("publish [{}]: {}", self.accelerator, commit_hash)
    }

    /// Message of the prune commit: `prune: <hash>`.
    pub fn prune_message(&self, commit_hash: &str) -> String {
        format!("prune: {commit_hash}")
    }

    /// Remote-tracking ref of the publication branch.
    pub fn pub_ref(&self) -> String {
        format!("{}/{}", self.remote, self.pub_branch)
    }
}

/// `refs/heads/feature/x` → `feature/x`, as CI agents report branches.
fn strip_ref_prefix(branch: &str) -> &str {
    branch.strip_prefix("refs/heads/").unwrap_or(branch)
}
