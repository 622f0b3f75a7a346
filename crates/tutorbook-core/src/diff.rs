//! Change detection between the source and publication branches.
//!
//! ```text
//! git diff --name-only ──► parent dirs ─┐
//!                                       ├──► resolve to tutorial folder ──► changed / dropped
//! source ⊖ published folders ───────────┘
//! ```
//!
//! A rename shows up as the old folder dropped plus the new folder changed.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::folders::{is_skipped, list_published_folders, list_tutorial_folders, normalize};
use crate::meta::find_meta;
use crate::paths::{CHANGED_FOLDERS_FILE, DROPPED_FOLDERS_FILE};

/// Tutorial folders known on each side of the diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderInventory {
    /// Folders with a manifest in the source tree.
    pub source: BTreeSet<String>,

    /// Folders with a notebook on the publication branch.
    pub published: BTreeSet<String>,
}

impl FolderInventory {
    pub fn new(
        source: impl IntoIterator<Item = String>,
        published: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            source: source.into_iter().collect(),
            published: published.into_iter().collect(),
        }
    }

    /// Scan a working tree that holds both the sources and `.notebooks/`.
    pub fn scan(root: &Path) -> Result<Self> {
        Ok(Self::new(
            list_tutorial_folders(root)?,
            list_published_folders(root)?,
        ))
    }

    /// Folders present on exactly one side.
    pub fn mismatched(&self) -> impl Iterator<Item = &String> {
        self.source.symmetric_difference(&self.published)
    }

    fn is_known(&self, folder: &str) -> bool {
        self.source.contains(folder) || self.published.contains(folder)
    }

    /// Nearest ancestor of `path` (itself included) that is a known folder.
    fn resolve(&self, path: &str) -> Option<String> {
        let mut current = path;
        loop {
            if self.is_known(current) {
                return Some(current.to_string());
            }
            current = &current[..current.rfind('/')?];
        }
    }
}

/// Result of change detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderChanges {
    /// Added or modified folders, sorted.
    pub changed: Vec<String>,

    /// Removed folders with a prior artifact, sorted.
    pub dropped: Vec<String>,
}

impl FolderChanges {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.dropped.is_empty()
    }

    /// Write `changed-folders.txt` and `dropped-folders.txt` into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        let changed = dir.join(CHANGED_FOLDERS_FILE);
        let dropped = dir.join(DROPPED_FOLDERS_FILE);
        write_folder_list(&changed, &self.changed)?;
        write_folder_list(&dropped, &self.dropped)?;
        Ok((changed, dropped))
    }

    /// Read both lists back from `dir`. Missing files count as empty lists.
    pub fn read_from(dir: &Path) -> Result<Self> {
        let read = |name: &str| -> Result<Vec<String>> {
            let path = dir.join(name);
            if path.exists() {
                read_folder_list(&path)
            } else {
                Ok(Vec::new())
            }
        };
        Ok(Self {
            changed: read(CHANGED_FOLDERS_FILE)?,
            dropped: read(DROPPED_FOLDERS_FILE)?,
        })
    }
}

/// Read a newline-delimited folder list, skipping blank lines.
pub fn read_folder_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Write a folder list, one path per line, no header.
pub fn write_folder_list(path: &Path, folders: &[String]) -> Result<()> {
    let mut content = String::new();
    for folder in folders {
        content.push_str(folder);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

/// Classifies folders touched by a diff into changed and dropped.
pub struct ChangeDetector {
    /// Root of the source working tree.
    root: PathBuf,

    /// Fail when a touched folder exists but has no manifest.
    strict: bool,
}

impl ChangeDetector {
    /// Create a strict detector over the source tree at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            strict: true,
        }
    }

    /// Toggle strict manifest checking.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Classify the folders touched by `diff_paths`.
    ///
    /// # Errors
    /// In strict mode, returns [`Error::FoldersWithoutMeta`] listing every
    /// touched folder that exists but carries no manifest.
    pub fn detect(&self, inventory: &FolderInventory, diff_paths: &[String]) -> Result<FolderChanges> {
        let mut candidates: BTreeSet<String> = diff_paths
            .iter()
            .filter_map(|p| Path::new(p.trim()).parent().map(normalize))
            .filter(|d| !d.is_empty())
            .collect();
        candidates.extend(inventory.mismatched().cloned());

        let folders: BTreeSet<String> = candidates
            .into_iter()
            .filter(|d| !is_skipped(d))
            .map(|d| inventory.resolve(&d).unwrap_or(d))
            .collect();

        let mut changed = Vec::new();
        let mut dropped = Vec::new();
        let mut invalid = Vec::new();

        for folder in folders {
            let dir = self.root.join(&folder);
            if dir.is_dir() {
                if find_meta(&dir).is_some() {
                    changed.push(folder);
                } else {
                    invalid.push(folder);
                }
            } else if inventory.published.contains(&folder) {
                dropped.push(folder);
            } else {
                tracing::debug!("Ignoring {} (neither in source nor published)", folder);
            }
        }

        if self.strict && !invalid.is_empty() {
            return Err(Error::FoldersWithoutMeta(invalid));
        }
        for folder in &invalid {
            tracing::warn!("Skipping {}: no metadata manifest", folder);
        }

        tracing::info!(
            "Detected {} changed and {} dropped folders",
            changed.len(),
            dropped.len()
        );

        Ok(FolderChanges { changed, dropped })
    }
}
