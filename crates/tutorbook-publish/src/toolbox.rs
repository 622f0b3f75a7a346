//! External effects available to pipeline stages.

use std::sync::Arc;

use tutorbook_core::{CommandRunner, GitCli, PipelineConfig, ProcessRunner, Vcs};

use crate::datasets::{DatasetFetcher, HttpFetcher};
use crate::error::PublishResult;
use crate::notebook::{NotebookExecutor, PapermillExecutor};

/// The seams through which stages touch git, processes, notebooks and the network.
pub struct Toolbox {
    pub vcs: Box<dyn Vcs>,
    pub runner: Arc<dyn CommandRunner>,
    pub executor: Box<dyn NotebookExecutor>,
    pub fetcher: Box<dyn DatasetFetcher>,
}

impl Toolbox {
    /// Real implementations: the `git` CLI, spawned processes, papermill and HTTP.
    pub fn system(config: &PipelineConfig) -> PublishResult<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
        Ok(Self {
            vcs: Box::new(GitCli::new(&config.root)?),
            executor: Box::new(PapermillExecutor::new(
                &config.python,
                &config.datasets_dir,
                Arc::clone(&runner),
            )),
            fetcher: Box::new(HttpFetcher::new(Arc::clone(&runner))),
            runner,
        })
    }
}
