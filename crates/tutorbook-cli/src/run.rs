//! Run command: the full publishing pipeline.

use std::path::Path;
use std::time::Instant;

use tutorbook_core::{FailurePolicy, PipelineConfig};
use tutorbook_publish::{Pipeline, PipelineContext, Toolbox};

use crate::colors;

/// Command-line settings that win over pipeline variables.
pub struct Overrides {
    pub accelerator: Option<String>,
    pub pub_branch: Option<String>,
    pub jobs: Option<usize>,
    pub fail_fast: bool,
    pub no_strict: bool,
}

impl Overrides {
    fn apply(self, config: &mut PipelineConfig) -> anyhow::Result<()> {
        if let Some(acc) = self.accelerator {
            config.accelerator = acc.parse()?;
        }
        if let Some(branch) = self.pub_branch {
            config.pub_branch = branch;
        }
        if let Some(jobs) = self.jobs {
            anyhow::ensure!(jobs > 0, "--jobs must be at least 1");
            config.render_jobs = jobs;
        }
        if self.fail_fast {
            config.failure_policy = FailurePolicy::FailFast;
        }
        if self.no_strict {
            config.strict = false;
        }
        Ok(())
    }
}

/// Execute the publishing pipeline.
pub fn execute(root: &Path, overrides: Overrides) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = PipelineConfig::from_env(root)?;
    overrides.apply(&mut config)?;

    println!(
        "\n{}tutorbook{} - publishing [{}] to '{}'",
        colors::BOLD,
        colors::RESET,
        config.accelerator,
        config.pub_branch
    );
    println!("{}", "─".repeat(50));

    let toolbox = Toolbox::system(&config)?;
    let mut context = PipelineContext::new(config, toolbox);
    let pipeline = Pipeline::standard();
    let result = pipeline.execute(&mut context)?;

    for stage in &result.stage_results {
        if stage.skipped {
            println!("  {}○ {} (skipped){}", colors::DIM, stage.stage_name, colors::RESET);
        } else if stage.success {
            println!(
                "  {}✓{} {} ({:.2}s)",
                colors::GREEN,
                colors::RESET,
                stage.stage_name,
                stage.duration.as_secs_f64()
            );
        } else {
            println!("  {}✗{} {}", colors::RED, colors::RESET, stage.stage_name);
        }
    }

    println!("{}", "─".repeat(50));

    if !result.success {
        anyhow::bail!(
            "{} failed: {}",
            result.failed_stage().map(|s| s.stage_name.as_str()).unwrap_or(pipeline.name()),
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    if result.exited_early {
        println!(
            "{}Nothing to publish:{} branch '{}' does not exist",
            colors::YELLOW,
            colors::RESET,
            context.config.pub_branch
        );
        return Ok(());
    }

    for folder in &context.skipped {
        println!(
            "  {}skipped{} {} (needs another accelerator)",
            colors::YELLOW,
            colors::RESET,
            folder
        );
    }
    for commit in &context.commits {
        println!("  {}{}{}", colors::CYAN, commit, colors::RESET);
    }
    println!(
        "{}Published{} {} notebook(s) in {:.2}s",
        colors::GREEN,
        colors::RESET,
        context.rendered.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
