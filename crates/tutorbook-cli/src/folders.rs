//! `list-dirs` and `group-folders`: folder discovery and change grouping.

use std::path::{Path, PathBuf};

use tutorbook_core::{
    ChangeDetector, FolderInventory, list_published_folders, list_tutorial_folders,
    read_folder_list,
};

use crate::colors;

/// Print tutorial folders, one per line.
pub fn list_dirs(root: &Path, published: bool) -> anyhow::Result<()> {
    let folders = if published {
        list_published_folders(root)?
    } else {
        list_tutorial_folders(root)?
    };
    for folder in folders {
        println!("{folder}");
    }
    Ok(())
}

/// Classify the paths in `diff_file` and write the changed/dropped lists.
///
/// `actual_dirs` holds two listing files (source folders, then published
/// folders). Without them both sides are scanned from `root`.
pub fn group_folders(
    root: &Path,
    diff_file: &Path,
    actual_dirs: &[PathBuf],
    strict: bool,
    output_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let diff_paths = read_folder_list(diff_file)?;

    let inventory = match actual_dirs {
        [] => FolderInventory::scan(root)?,
        [source, published] => FolderInventory::new(
            read_folder_list(source)?,
            read_folder_list(published)?,
        ),
        _ => anyhow::bail!(
            "--actual-dirs takes two files (source folders, published folders), got {}",
            actual_dirs.len()
        ),
    };

    let changes = ChangeDetector::new(root)
        .strict(strict)
        .detect(&inventory, &diff_paths)?;
    let (changed_file, dropped_file) = changes.write_to(output_dir.unwrap_or(root))?;

    println!(
        "{}Changed{} {} folder(s) → {}",
        colors::GREEN,
        colors::RESET,
        changes.changed.len(),
        changed_file.display()
    );
    for folder in &changes.changed {
        println!("  {folder}");
    }
    println!(
        "{}Dropped{} {} folder(s) → {}",
        colors::YELLOW,
        colors::RESET,
        changes.dropped.len(),
        dropped_file.display()
    );
    for folder in &changes.dropped {
        println!("  {folder}");
    }

    Ok(())
}
