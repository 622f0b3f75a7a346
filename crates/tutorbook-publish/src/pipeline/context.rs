use tutorbook_core::{FolderChanges, PipelineConfig};

use super::core::PipelineState;
use crate::error::{PublishError, PublishResult};
use crate::toolbox::Toolbox;

/// Counts that guard the conditional stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineVariables {
    pub changed_folders: usize,
    pub dropped_folders: usize,
}

/// State carried from stage to stage during one run.
pub struct PipelineContext {
    run_id: String,
    pub config: PipelineConfig,
    pub toolbox: Toolbox,
    pub state: PipelineState,

    /// Source commit being published.
    pub commit_hash: Option<String>,

    /// Source branch the run started on.
    pub source_branch: Option<String>,

    pub changes: Option<FolderChanges>,
    pub variables: PipelineVariables,

    /// Folders rendered into artifacts.
    pub rendered: Vec<String>,

    /// Folders left out because they do not support the run's accelerator.
    pub skipped: Vec<String>,

    /// Messages of the commits made on the publication branch.
    pub commits: Vec<String>,

    pub pushed: bool,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig, toolbox: Toolbox) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            config,
            toolbox,
            state: PipelineState::Start,
            commit_hash: None,
            source_branch: None,
            changes: None,
            variables: PipelineVariables::default(),
            rendered: Vec::new(),
            skipped: Vec::new(),
            commits: Vec::new(),
            pushed: false,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Record detected changes and derive the stage guards from them.
    pub fn record_changes(&mut self, changes: FolderChanges) {
        self.variables = PipelineVariables {
            changed_folders: changes.changed.len(),
            dropped_folders: changes.dropped.len(),
        };
        self.changes = Some(changes);
    }

    pub fn changes(&self) -> PublishResult<&FolderChanges> {
        self.changes
            .as_ref()
            .ok_or_else(|| PublishError::Context("folder changes have not been detected".to_string()))
    }

    pub fn commit_hash(&self) -> PublishResult<&str> {
        self.commit_hash
            .as_deref()
            .ok_or_else(|| PublishError::Context("source commit is not resolved".to_string()))
    }
}
