//! Notebook header built from tutorial metadata.

use tutorbook_core::TutorialMeta;

use crate::parser::ScriptCell;

/// Cells prepended to every generated notebook.
///
/// The first cell introduces the tutorial (title, author, license, generation
/// time, description). When the tutorial has requirements, a setup note and a
/// `pip install` cell follow.
pub fn header_cells(meta: &TutorialMeta, generated: &str) -> Vec<ScriptCell> {
    let mut intro = format!(
        "# {}\n\n* **Author:** {}\n* **License:** {}\n* **Generated:** {}\n\n{}\n\n---",
        meta.title.trim(),
        meta.author.trim(),
        meta.license.trim(),
        generated,
        meta.description.trim()
    );
    if !meta.tags.is_empty() {
        intro = format!("{intro}\n*Tags:* {}", meta.tags.join(", "));
    }

    let mut cells = vec![ScriptCell::markdown(intro)];

    if let Some(pip) = pip_install_line(meta) {
        cells.push(ScriptCell::markdown(
            "## Setup\nThis notebook requires some packages besides the base environment.\nMake sure they are installed before running it:",
        ));
        cells.push(ScriptCell::code(pip));
    }

    cells
}

/// `! pip install --quiet "a" "b"` for the tutorial's requirements.
pub fn pip_install_line(meta: &TutorialMeta) -> Option<String> {
    if meta.requirements.is_empty() {
        return None;
    }
    let args: Vec<String> = meta
        .pip_arguments()
        .into_iter()
        .map(|arg| {
            if arg.starts_with("--") {
                arg
            } else {
                format!("\"{arg}\"")
            }
        })
        .collect();
    Some(format!("! pip install --quiet {}", args.join(" ")))
}
