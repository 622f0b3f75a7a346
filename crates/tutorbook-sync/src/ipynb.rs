//! Jupyter notebook (.ipynb) model and generation.
//!
//! Converts script cells to Jupyter notebook format (nbformat 4.5). The same
//! model reads rendered notebooks back, so it accepts `source`/`text` either
//! as a single string or as a list of lines.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tutorbook_core::TutorialMeta;

use crate::error::{SyncError, SyncResult};
use crate::parser::{CellType, ScriptCell};

/// A Jupyter notebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupyterNotebook {
    /// Notebook metadata
    pub metadata: JupyterMetadata,

    /// Format version (always 4)
    pub nbformat: u32,

    /// Minor format version
    pub nbformat_minor: u32,

    /// Notebook cells
    pub cells: Vec<JupyterCell>,
}

/// Jupyter notebook metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupyterMetadata {
    /// Kernel specification
    pub kernelspec: KernelSpec,

    /// Language info
    pub language_info: LanguageInfo,

    /// Tutorial provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tutorbook: Option<TutorbookMetadata>,

    /// Anything else (e.g. `papermill` execution records)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Kernel specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSpec {
    /// Display name
    pub display_name: String,

    /// Language
    pub language: String,

    /// Kernel name
    pub name: String,
}

/// Language information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// Language name
    pub name: String,

    /// Everything the kernel reports besides the name
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where a generated notebook came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialProvenance {
    /// Tutorial folder relative to the repository root
    pub folder: String,

    /// Script file name
    pub script: String,
}

/// Tutorbook-specific metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorbookMetadata {
    /// Tutorial title
    pub title: String,

    /// Accelerators the tutorial runs on
    pub accelerator: Vec<String>,

    /// Source of the notebook
    pub source: TutorialProvenance,

    /// Generator version
    pub version: String,
}

/// A Jupyter cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum JupyterCell {
    Markdown {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(deserialize_with = "multiline")]
        source: Vec<String>,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(deserialize_with = "multiline")]
        source: Vec<String>,
        #[serde(default)]
        outputs: Vec<CellOutput>,
        #[serde(default)]
        execution_count: Option<u32>,
    },
    Raw {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        metadata: Map<String, Value>,
        #[serde(deserialize_with = "multiline")]
        source: Vec<String>,
    },
}

impl JupyterCell {
    /// Cell source joined back into one string.
    pub fn source_text(&self) -> String {
        match self {
            JupyterCell::Markdown { source, .. }
            | JupyterCell::Code { source, .. }
            | JupyterCell::Raw { source, .. } => source.concat(),
        }
    }

    /// Cell type name as written in the notebook.
    pub fn type_name(&self) -> &'static str {
        match self {
            JupyterCell::Markdown { .. } => "markdown",
            JupyterCell::Code { .. } => "code",
            JupyterCell::Raw { .. } => "raw",
        }
    }
}

/// Cell output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "output_type")]
pub enum CellOutput {
    /// Standard output/error
    #[serde(rename = "stream")]
    Stream {
        name: String,
        #[serde(deserialize_with = "multiline")]
        text: Vec<String>,
    },

    /// Rich display data
    #[serde(rename = "execute_result")]
    ExecuteResult {
        execution_count: Option<u32>,
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },

    /// Display data
    #[serde(rename = "display_data")]
    DisplayData {
        data: Map<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },

    /// Error output
    #[serde(rename = "error")]
    Error {
        ename: String,
        evalue: String,
        traceback: Vec<String>,
    },
}

/// Accept a string or a list of strings, as nbformat allows.
fn multiline<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Multiline {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Multiline::deserialize(deserializer)? {
        Multiline::One(s) => split_source(&s),
        Multiline::Many(v) => v,
    })
}

/// Split text into nbformat source lines: every line keeps its `\n` except the last.
pub fn split_source(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

impl JupyterNotebook {
    /// Create a new empty notebook.
    pub fn new() -> Self {
        Self {
            metadata: JupyterMetadata::default(),
            nbformat: 4,
            nbformat_minor: 5,
            cells: Vec::new(),
        }
    }

    /// Write the notebook to a file, creating parent directories.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> SyncResult<()> {
        let path = path.as_ref();
        let write_error = |e: std::io::Error| SyncError::WriteError {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json).map_err(write_error)?;
        Ok(())
    }

    /// Read a notebook from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| SyncError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let notebook: Self = serde_json::from_str(&content)?;
        if notebook.nbformat != 4 {
            return Err(SyncError::InvalidNotebook(format!(
                "{}: unsupported nbformat {}",
                path.display(),
                notebook.nbformat
            )));
        }
        Ok(notebook)
    }

    /// Error outputs recorded in code cells, as `(ename, evalue)`.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.cells
            .iter()
            .filter_map(|cell| match cell {
                JupyterCell::Code { outputs, .. } => Some(outputs),
                _ => None,
            })
            .flatten()
            .filter_map(|output| match output {
                CellOutput::Error { ename, evalue, .. } => Some((ename.clone(), evalue.clone())),
                _ => None,
            })
            .collect()
    }
}

impl Default for JupyterNotebook {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for JupyterMetadata {
    fn default() -> Self {
        Self {
            kernelspec: KernelSpec {
                display_name: "Python 3".to_string(),
                language: "python".to_string(),
                name: "python3".to_string(),
            },
            language_info: LanguageInfo {
                name: "python".to_string(),
                extra: Map::new(),
            },
            tutorbook: None,
            extra: Map::new(),
        }
    }
}

/// Generator for Jupyter notebooks from script cells.
pub struct IpynbGenerator {
    /// Next cell index, used for stable cell ids
    next_id: usize,
}

impl IpynbGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Generate a Jupyter notebook for a tutorial.
    pub fn generate(
        &mut self,
        meta: &TutorialMeta,
        provenance: TutorialProvenance,
        cells: &[ScriptCell],
    ) -> JupyterNotebook {
        let mut notebook = JupyterNotebook::new();

        notebook.metadata.tutorbook = Some(TutorbookMetadata {
            title: meta.title.clone(),
            accelerator: meta.accelerator.iter().map(|a| a.to_string()).collect(),
            source: provenance,
            version: env!("CARGO_PKG_VERSION").to_string(),
        });

        notebook.cells = cells.iter().map(|cell| self.convert_cell(cell)).collect();
        notebook
    }

    /// Convert a script cell to a Jupyter cell.
    fn convert_cell(&mut self, cell: &ScriptCell) -> JupyterCell {
        let id = Some(format!("cell-{:04}", self.next_id));
        self.next_id += 1;
        let source = split_source(&cell.source);

        match cell.cell_type {
            CellType::Markdown => JupyterCell::Markdown {
                id,
                metadata: Map::new(),
                source,
            },
            CellType::Raw => JupyterCell::Raw {
                id,
                metadata: Map::new(),
                source,
            },
            CellType::Code => JupyterCell::Code {
                id,
                metadata: Map::new(),
                source,
                outputs: Vec::new(),
                execution_count: None,
            },
        }
    }
}

impl Default for IpynbGenerator {
    fn default() -> Self {
        Self::new()
    }
}
