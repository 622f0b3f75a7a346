//! `generate` and `validate`: single-folder commands that need no tooling.

use std::path::Path;

use tutorbook_core::TutorialFolder;
use tutorbook_publish::pipeline::stages::timestamp;
use tutorbook_sync::generate_notebook;

use crate::colors;

/// Generate the notebook of one tutorial folder next to its script.
pub fn generate(root: &Path, folder: &str) -> anyhow::Result<()> {
    let folder = TutorialFolder::open(root, folder)?;
    let generated = generate_notebook(&folder, &timestamp())?;

    println!(
        "{}✓{} {} → {} ({} cells)",
        colors::GREEN,
        colors::RESET,
        generated.folder,
        generated.path.display(),
        generated.cell_count
    );
    Ok(())
}

/// Check that a folder has a valid manifest and exactly one script.
pub fn validate(root: &Path, folder: &str) -> anyhow::Result<()> {
    let folder = TutorialFolder::open(root, folder)?;
    let meta = tutorbook_core::TutorialMeta::load(&folder.meta_path)?;
    let script = folder.script_path()?;

    let accelerators: Vec<&str> = meta.accelerator.iter().map(|a| a.as_str()).collect();
    println!(
        "{}✓{} {} {}({}){}",
        colors::GREEN,
        colors::RESET,
        folder.rel_path,
        colors::DIM,
        meta.title,
        colors::RESET
    );
    println!("  script:       {}", script.file_name().unwrap_or_default().to_string_lossy());
    println!("  accelerator:  {}", accelerators.join(", "));
    if !meta.requirements.is_empty() {
        println!("  requirements: {}", meta.requirements.join(", "));
    }
    if !meta.datasets.is_empty() {
        println!(
            "  datasets:     {}",
            meta.datasets
                .web
                .iter()
                .chain(&meta.datasets.kaggle)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(())
}
