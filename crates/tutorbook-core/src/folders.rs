//! Tutorial folder discovery.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::meta::find_meta;
use crate::paths::{NOTEBOOK_EXT, PUBLISH_DIR};

/// Path components that never belong to a tutorial.
pub const SKIP_DIRS: &[&str] = &[
    ".actions",
    ".azure",
    ".datasets",
    ".git",
    ".github",
    ".notebooks",
    "_docs",
    "_TEMP",
    "_requirements",
    "docs",
];

/// Extension of tutorial scripts.
pub const SCRIPT_EXT: &str = "py";

/// A tutorial folder in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorialFolder {
    /// Path relative to the repository root, `/`-separated.
    pub rel_path: String,
    /// Absolute path of the folder.
    pub dir: PathBuf,
    /// Metadata manifest.
    pub meta_path: PathBuf,
}

impl TutorialFolder {
    /// Resolve a relative folder path under `root`.
    pub fn open(root: &Path, rel_path: &str) -> Result<Self> {
        let dir = root.join(rel_path);
        let meta_path = find_meta(&dir).ok_or_else(|| Error::MetaNotFound(dir.clone()))?;
        Ok(Self {
            rel_path: rel_path.to_string(),
            dir,
            meta_path,
        })
    }

    /// The single percent-format script of this tutorial.
    pub fn script_path(&self) -> Result<PathBuf> {
        let mut scripts: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == SCRIPT_EXT))
            .collect();

        if scripts.len() != 1 {
            return Err(Error::ScriptNotFound {
                path: self.dir.clone(),
                found: scripts.len(),
            });
        }
        Ok(scripts.remove(0))
    }
}

/// Whether any component of a relative path is on the skip list.
pub fn is_skipped(rel_path: &str) -> bool {
    rel_path.split('/').any(|part| SKIP_DIRS.contains(&part))
}

/// Convert a relative path to the `/`-separated form used in folder lists.
pub fn normalize(rel_path: &Path) -> String {
    rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// List every tutorial folder (directory with a manifest) under `root`.
///
/// Returned paths are relative to `root` and sorted.
pub fn list_tutorial_folders(root: &Path) -> Result<Vec<String>> {
    let mut found = BTreeSet::new();
    walk(root, root, &mut found)?;
    Ok(found.into_iter().collect())
}

fn walk(root: &Path, dir: &Path, found: &mut BTreeSet<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // Symlinked directories are not followed; a link back up would loop.
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let path = entry.path();
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let rel = normalize(rel);
        if is_skipped(&rel) {
            continue;
        }
        if find_meta(&path).is_some() {
            found.insert(rel.clone());
        }
        walk(root, &path, found)?;
    }
    Ok(())
}

/// Map published notebook paths (`.notebooks/<folder>.ipynb`) to folders.
///
/// Paths outside the publish directory or without the notebook extension
/// are ignored.
pub fn published_folders<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let prefix = format!("{PUBLISH_DIR}/");
    let suffix = format!(".{NOTEBOOK_EXT}");
    let found: BTreeSet<String> = paths
        .into_iter()
        .filter_map(|p| p.trim().strip_prefix(&prefix))
        .filter_map(|p| p.strip_suffix(&suffix))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    found.into_iter().collect()
}

/// List folders that have a published notebook under `root/.notebooks`.
pub fn list_published_folders(root: &Path) -> Result<Vec<String>> {
    let publish_dir = root.join(PUBLISH_DIR);
    if !publish_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    collect_files(root, &publish_dir, &mut files)?;
    Ok(published_folders(files.iter().map(String::as_str)))
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(root, &path, files)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            files.push(normalize(rel));
        }
    }
    Ok(())
}
