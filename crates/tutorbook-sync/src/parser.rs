//! Parser for percent-format tutorial scripts.
//!
//! Cells are delimited by `# %%` marker lines:
//!
//! ```text
//! # %% [markdown]
//! # ## Define Data Augmentations module
//!
//! # %%
//! class DataAugmentation(nn.Module):
//!     ...
//! ```
//!
//! Markdown and raw cells are commented out in the script; the leading `# `
//! is stripped. Commented magics in code cells (`# %matplotlib inline`,
//! `# !pip install x`) are restored.

use std::fs;
use std::path::Path;

use crate::error::{SyncError, SyncResult};

/// Marker that opens a new cell.
const CELL_MARKER: &str = "# %%";

/// Type of cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    /// Markdown documentation cell
    Markdown,
    /// Executable code cell
    Code,
    /// Raw cell, passed through unrendered
    Raw,
}

/// A cell extracted from a tutorial script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCell {
    /// Cell type
    pub cell_type: CellType,

    /// Cell text, without the comment prefix for markdown/raw cells
    pub source: String,
}

impl ScriptCell {
    pub fn markdown(source: impl Into<String>) -> Self {
        Self {
            cell_type: CellType::Markdown,
            source: source.into(),
        }
    }

    pub fn code(source: impl Into<String>) -> Self {
        Self {
            cell_type: CellType::Code,
            source: source.into(),
        }
    }
}

/// Parser for percent-format scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptParser;

impl ScriptParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a script file into cells.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> SyncResult<Vec<ScriptCell>> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| SyncError::ReadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(self.parse_source(&source))
    }

    /// Parse script text into cells. Blank cells are dropped.
    pub fn parse_source(&self, source: &str) -> Vec<ScriptCell> {
        let mut cells = Vec::new();
        // Text before the first marker is a code cell.
        let mut current = CellType::Code;
        let mut lines: Vec<&str> = Vec::new();

        for line in source.lines() {
            if let Some(rest) = line.strip_prefix(CELL_MARKER) {
                Self::flush(current, &lines, &mut cells);
                lines.clear();
                current = Self::marker_type(rest);
            } else {
                lines.push(line);
            }
        }
        Self::flush(current, &lines, &mut cells);

        cells
    }

    /// Cell type from the text following `# %%`.
    fn marker_type(rest: &str) -> CellType {
        let rest = rest.trim_start();
        if rest.starts_with("[markdown]") || rest.starts_with("[md]") {
            CellType::Markdown
        } else if rest.starts_with("[raw]") {
            CellType::Raw
        } else {
            CellType::Code
        }
    }

    fn flush(cell_type: CellType, lines: &[&str], cells: &mut Vec<ScriptCell>) {
        let converted: Vec<String> = match cell_type {
            CellType::Markdown | CellType::Raw => lines.iter().map(|l| uncomment(l)).collect(),
            CellType::Code => lines.iter().map(|l| restore_magic(l)).collect(),
        };

        let start = converted.iter().position(|l| !l.trim().is_empty());
        let end = converted.iter().rposition(|l| !l.trim().is_empty());
        if let (Some(start), Some(end)) = (start, end) {
            cells.push(ScriptCell {
                cell_type,
                source: converted[start..=end].join("\n"),
            });
        }
    }
}

/// `# text` → `text`, `#` → empty line.
fn uncomment(line: &str) -> String {
    let trimmed = line.trim_end();
    if trimmed == "#" {
        String::new()
    } else if let Some(text) = trimmed.strip_prefix("# ") {
        text.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `# %magic` / `# !command` → `%magic` / `!command`.
fn restore_magic(line: &str) -> String {
    if let Some(rest) = line.strip_prefix("# ") {
        let is_line_magic = rest.starts_with('%') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic());
        if is_line_magic || rest.starts_with('!') {
            return rest.to_string();
        }
    }
    line.to_string()
}
