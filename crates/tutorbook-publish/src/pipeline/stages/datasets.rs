use tutorbook_core::TutorialMeta;

use crate::error::PublishResult;
use crate::pipeline::{PipelineContext, PipelineStage, PipelineState, StageOutcome};

/// Downloads the datasets declared by changed tutorials into `PATH_DATASETS`.
///
/// Tutorials that will not render on this run's accelerator are left out.
/// So are tutorials whose manifest does not load; the render stage reports
/// them alongside every other failing folder.
pub struct DatasetStage;

impl PipelineStage for DatasetStage {
    fn execute(&self, context: &mut PipelineContext) -> PublishResult<StageOutcome> {
        let config = &context.config;
        let fetcher = &context.toolbox.fetcher;
        let dest = &config.datasets_dir;
        let mut fetched = 0;

        for folder in &context.changes()?.changed {
            let meta = match TutorialMeta::load_from_dir(&config.root.join(folder)) {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!("{}: no datasets fetched: {}", folder, e);
                    continue;
                }
            };
            if !meta.supports(config.accelerator) || meta.datasets.is_empty() {
                continue;
            }
            for url in &meta.datasets.web {
                let path = fetcher.fetch_web(url, dest)?;
                tracing::debug!("{}: {} → {}", folder, url, path.display());
                fetched += 1;
            }
            for competition in &meta.datasets.kaggle {
                fetcher.fetch_kaggle(competition, dest)?;
                fetched += 1;
            }
        }

        tracing::info!("{} dataset(s) available in {}", fetched, dest.display());
        Ok(StageOutcome::Continue)
    }

    fn name(&self) -> &str {
        "datasets"
    }

    fn target_state(&self) -> PipelineState {
        PipelineState::DatasetsFetched
    }
}
