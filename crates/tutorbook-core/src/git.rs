//! Version-control operations used by the publishing pipeline.
//!
//! [`Vcs`] is the seam between pipeline stages and git; [`GitCli`] drives the
//! `git` binary found in `PATH`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use url::Url;

use crate::error::{Error, Result};

/// Placeholder for credentials in logged URLs.
const REDACTED: &str = "***";

/// Git operations needed to detect changes and publish notebooks.
pub trait Vcs: Send + Sync {
    /// Whether `branch` exists on `remote`.
    fn remote_branch_exists(&self, remote: &str, branch: &str) -> Result<bool>;

    /// Fetch all refs from `remote`.
    fn fetch(&self, remote: &str) -> Result<()>;

    /// Resolve a revision to a commit hash.
    fn rev_parse(&self, rev: &str) -> Result<String>;

    /// Name of the checked-out branch.
    fn current_branch(&self) -> Result<String>;

    /// Paths that differ between `base` and `HEAD`.
    fn diff_names(&self, base: &str) -> Result<Vec<String>>;

    /// Files tracked at `rev` under `path`.
    fn list_tree(&self, rev: &str, path: &str) -> Result<Vec<String>>;

    /// Check out `branch`, resetting it to `start_point`.
    fn checkout(&self, branch: &str, start_point: &str) -> Result<()>;

    /// Merge `rev` into the checked-out branch.
    fn merge(&self, rev: &str) -> Result<()>;

    /// Stage paths.
    fn add(&self, paths: &[PathBuf]) -> Result<()>;

    /// Remove paths from index and working tree; absent paths are ignored.
    fn remove(&self, paths: &[PathBuf]) -> Result<()>;

    /// Whether the index differs from `HEAD`.
    fn has_staged_changes(&self) -> Result<bool>;

    /// Commit the index.
    fn commit(&self, message: &str) -> Result<()>;

    /// Push `branch` to `remote` (a remote name or URL).
    fn push(&self, remote: &str, branch: &str) -> Result<()>;

    /// Set the committer identity for this repository.
    fn set_identity(&self, name: &str, email: &str) -> Result<()>;
}

/// [`Vcs`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    /// Path to the git binary.
    git: PathBuf,

    /// Working tree the commands run in.
    workdir: PathBuf,
}

impl GitCli {
    /// Locate git in `PATH` and bind it to `workdir`.
    pub fn new(workdir: impl AsRef<Path>) -> Result<Self> {
        let git = which::which("git").map_err(|_| Error::ToolNotFound("git".to_string()))?;
        Ok(Self {
            git,
            workdir: workdir.as_ref().to_path_buf(),
        })
    }

    /// Working tree of this repository.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        let shown: Vec<String> = args.iter().map(|a| redact(a)).collect();
        tracing::debug!("git {}", shown.join(" "));
        Command::new(&self.git)
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| Error::Git {
                command: args.first().copied().unwrap_or_default().to_string(),
                message: format!("failed to run git: {e}"),
            })
    }

    /// Run git and return trimmed stdout, failing on a non-zero exit.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(Error::Git {
                command: args.first().copied().unwrap_or_default().to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run_with_paths(&self, args: &[&str], paths: &[PathBuf]) -> Result<String> {
        let mut all: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        all.push("--".to_string());
        all.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        self.run(&refs)
    }
}

/// Hide the credentials of a URL; anything else is returned as is.
pub fn redact(arg: &str) -> String {
    match Url::parse(arg) {
        Ok(mut url) if !url.username().is_empty() || url.password().is_some() => {
            if url.set_username(REDACTED).is_err() {
                return REDACTED.to_string();
            }
            let _ = url.set_password(None);
            url.to_string()
        }
        _ => arg.to_string(),
    }
}

/// Split `-z` output into paths. Paths are kept verbatim, non-ASCII included.
fn nul_separated(output: &str) -> Vec<String> {
    output
        .split('\0')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

impl Vcs for GitCli {
    fn remote_branch_exists(&self, remote: &str, branch: &str) -> Result<bool> {
        let refs = self.run(&["ls-remote", "--heads", remote, branch])?;
        let wanted = format!("refs/heads/{branch}");
        Ok(refs
            .lines()
            .any(|l| l.split_whitespace().nth(1) == Some(wanted.as_str())))
    }

    fn fetch(&self, remote: &str) -> Result<()> {
        self.run(&["fetch", "--quiet", remote]).map(drop)
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        self.run(&["rev-parse", "--verify", rev])
    }

    fn current_branch(&self) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn diff_names(&self, base: &str) -> Result<Vec<String>> {
        self.run(&["diff", "--name-only", "-z", base, "HEAD"])
            .map(|o| nul_separated(&o))
    }

    fn list_tree(&self, rev: &str, path: &str) -> Result<Vec<String>> {
        self.run(&["ls-tree", "-r", "--name-only", "-z", rev, "--", path])
            .map(|o| nul_separated(&o))
    }

    fn checkout(&self, branch: &str, start_point: &str) -> Result<()> {
        self.run(&["checkout", "--quiet", "-B", branch, start_point])
            .map(drop)
    }

    fn merge(&self, rev: &str) -> Result<()> {
        self.run(&["merge", "--no-edit", "-s", "resolve", rev]).map(drop)
    }

    fn add(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        self.run_with_paths(&["add", "--force"], paths).map(drop)
    }

    fn remove(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        self.run_with_paths(&["rm", "--quiet", "--ignore-unmatch"], paths)
            .map(drop)
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let output = self.output(&["diff", "--cached", "--quiet"])?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(Error::Git {
                command: "diff".to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "--quiet", "-m", message]).map(drop)
    }

    fn push(&self, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("{branch}:{branch}");
        self.run(&["push", "--quiet", remote, &refspec])
            .map(drop)
            .map_err(|e| match e {
                Error::Git { command, message } => Error::Git {
                    command,
                    message: message.replace(remote, &redact(remote)),
                },
                other => other,
            })
    }

    fn set_identity(&self, name: &str, email: &str) -> Result<()> {
        self.run(&["config", "user.name", name])?;
        self.run(&["config", "user.email", email]).map(drop)
    }
}
