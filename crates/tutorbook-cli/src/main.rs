//! tutorbook CLI - render tutorial scripts into notebooks and publish them.

mod colors;
mod folders;
mod generate;
mod render;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tutorbook")]
#[command(about = "Render tutorial scripts into notebooks and publish them to a branch")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full publishing pipeline
    Run {
        /// Accelerator of this run (overrides ACCELERATOR)
        #[arg(long)]
        accelerator: Option<String>,

        /// Publication branch (overrides PUB_BRANCH)
        #[arg(long)]
        pub_branch: Option<String>,

        /// Notebooks rendered concurrently (overrides RENDER_JOBS)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,

        /// Stop at the first failing tutorial
        #[arg(long)]
        fail_fast: bool,

        /// Skip touched folders without a manifest instead of failing
        #[arg(long)]
        no_strict: bool,
    },

    /// List tutorial folders
    ListDirs {
        /// List folders with a published notebook instead
        #[arg(long)]
        published: bool,
    },

    /// Group a list of changed files into changed and dropped tutorial folders
    GroupFolders {
        /// File with one changed path per line (`git diff --name-only` output)
        diff_file: PathBuf,

        /// Files listing source folders and published folders, in that order
        #[arg(long, num_args = 1..)]
        actual_dirs: Vec<PathBuf>,

        /// Skip folders without a manifest instead of failing
        #[arg(long)]
        no_strict: bool,

        /// Directory receiving changed-folders.txt and dropped-folders.txt
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Generate the notebook of a tutorial folder
    Generate {
        /// Tutorial folder relative to the root
        folder: String,
    },

    /// Generate and execute a tutorial folder into .notebooks/ without committing
    Render {
        /// Tutorial folder relative to the root
        folder: String,
    },

    /// Check a tutorial folder's manifest and script
    Validate {
        /// Tutorial folder relative to the root
        folder: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = cli.root.as_path();

    match cli.command {
        Commands::Run {
            accelerator,
            pub_branch,
            jobs,
            fail_fast,
            no_strict,
        } => run::execute(
            root,
            run::Overrides {
                accelerator,
                pub_branch,
                jobs,
                fail_fast,
                no_strict,
            },
        )
        .map_err(format_error)?,

        Commands::ListDirs { published } => folders::list_dirs(root, published).map_err(format_error)?,

        Commands::GroupFolders {
            diff_file,
            actual_dirs,
            no_strict,
            output_dir,
        } => folders::group_folders(
            root,
            &diff_file,
            &actual_dirs,
            !no_strict,
            output_dir.as_deref(),
        )
        .map_err(format_error)?,

        Commands::Generate { folder } => generate::generate(root, &folder).map_err(format_error)?,

        Commands::Render { folder } => render::execute(root, &folder).map_err(format_error)?,

        Commands::Validate { folder } => generate::validate(root, &folder).map_err(format_error)?,
    }

    Ok(())
}

/// Attach recovery hints to core errors, wherever they are wrapped.
fn format_error(err: anyhow::Error) -> anyhow::Error {
    let core = err
        .downcast_ref::<tutorbook_core::Error>()
        .or_else(|| match err.downcast_ref::<tutorbook_publish::PublishError>() {
            Some(tutorbook_publish::PublishError::Core(e)) => Some(e),
            _ => None,
        })
        .or_else(|| match err.downcast_ref::<tutorbook_sync::SyncError>() {
            Some(tutorbook_sync::SyncError::Core(e)) => Some(e),
            _ => None,
        });

    match core {
        Some(e) => anyhow::anyhow!("{}", e.with_hint()),
        None => err,
    }
}
