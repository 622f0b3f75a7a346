//! Notebook generator for tutorbook.
//!
//! Converts a tutorial folder (percent-format script + metadata manifest)
//! into a runnable Jupyter notebook.
//!
//! # Architecture
//!
//! ```text
//! script.py ─────► ScriptParser ─────► ScriptCell[] ─┐
//!                                                   ├──► IpynbGenerator ─────► script.ipynb
//! .meta.yml ─────► TutorialMeta ─────► header_cells ─┘
//! ```

mod error;
mod header;
mod ipynb;
mod parser;

pub use error::{SyncError, SyncResult};
pub use header::{header_cells, pip_install_line};
pub use ipynb::{
    CellOutput, IpynbGenerator, JupyterCell, JupyterMetadata, JupyterNotebook, TutorbookMetadata,
    TutorialProvenance, split_source,
};
pub use parser::{CellType, ScriptCell, ScriptParser};

use std::path::{Path, PathBuf};

use tutorbook_core::{TutorialFolder, TutorialMeta};

/// A notebook generated for one tutorial folder.
#[derive(Debug, Clone)]
pub struct GeneratedNotebook {
    /// Tutorial folder relative to the repository root.
    pub folder: String,

    /// Where the notebook was written.
    pub path: PathBuf,

    /// Validated manifest of the tutorial.
    pub meta: TutorialMeta,

    /// Number of cells, header included.
    pub cell_count: usize,
}

/// Generate the notebook for a tutorial folder and write it next to the script.
///
/// `generated` is the timestamp shown in the notebook header.
///
/// # Errors
/// Fails when the manifest is missing or invalid, or when the folder does not
/// hold exactly one script.
pub fn generate_notebook(folder: &TutorialFolder, generated: &str) -> SyncResult<GeneratedNotebook> {
    let meta = TutorialMeta::load(&folder.meta_path)?;
    let script = folder.script_path()?;

    let mut cells = header_cells(&meta, generated);
    cells.extend(ScriptParser::new().parse_file(&script)?);

    let provenance = TutorialProvenance {
        folder: folder.rel_path.clone(),
        script: script
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string(),
    };

    let notebook = IpynbGenerator::new().generate(&meta, provenance, &cells);
    let path = default_ipynb_path(&script);
    notebook.write_to_file(&path)?;

    tracing::info!(
        "Generated {} → {} ({} cells)",
        script.display(),
        path.display(),
        cells.len()
    );

    Ok(GeneratedNotebook {
        folder: folder.rel_path.clone(),
        path,
        meta,
        cell_count: cells.len(),
    })
}

/// Get the default `.ipynb` path for a tutorial script.
pub fn default_ipynb_path(script_path: impl AsRef<Path>) -> PathBuf {
    script_path.as_ref().with_extension("ipynb")
}
