//! Publication layout.
//!
//! Rendered tutorials live under a single directory on the publication
//! branch, mirroring the folder structure of the source branch:
//!
//! ```text
//! .notebooks/
//! └── course_UvA-DL/
//!     ├── 02-activation-functions.ipynb   # rendered notebook
//!     └── 02-activation-functions.yaml    # companion metadata
//! ```

use std::path::{Path, PathBuf};

/// Directory holding published artifacts.
pub const PUBLISH_DIR: &str = ".notebooks";

/// Extension of notebook artifacts.
pub const NOTEBOOK_EXT: &str = "ipynb";

/// Extension of companion metadata artifacts.
pub const META_EXT: &str = "yaml";

/// Default file name of the changed-folders list.
pub const CHANGED_FOLDERS_FILE: &str = "changed-folders.txt";

/// Default file name of the dropped-folders list.
pub const DROPPED_FOLDERS_FILE: &str = "dropped-folders.txt";

/// Published artifacts of one tutorial folder, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Rendered notebook.
    pub notebook: PathBuf,

    /// Companion metadata.
    pub meta: PathBuf,
}

impl ArtifactPaths {
    /// Artifact paths for a `/`-separated tutorial folder.
    ///
    /// # Arguments
    /// * `folder` - Folder relative to the repository root (e.g. `course_UvA-DL/02-activation-functions`)
    pub fn for_folder(folder: &str) -> Self {
        let base = Path::new(PUBLISH_DIR).join(folder.trim_matches('/'));
        Self {
            notebook: with_suffix(&base, NOTEBOOK_EXT),
            meta: with_suffix(&base, META_EXT),
        }
    }

    /// Both artifacts, notebook first.
    pub fn all(&self) -> [&Path; 2] {
        [&self.notebook, &self.meta]
    }

    /// Resolve both artifacts against a repository root.
    pub fn under(&self, root: &Path) -> Self {
        Self {
            notebook: root.join(&self.notebook),
            meta: root.join(&self.meta),
        }
    }
}

/// Append an extension without replacing dots already in the file name
/// (`02-intro.v2` must become `02-intro.v2.ipynb`).
fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Default dataset download directory when `PATH_DATASETS` is unset.
pub fn default_datasets_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tutorbook")
        .join("datasets")
}
