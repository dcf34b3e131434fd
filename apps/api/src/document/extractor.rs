//! Document text extraction for uploaded résumés.
//!
//! Word documents are parsed with `docx-rs`. Each body paragraph becomes one
//! output line built from its text runs, in document order. Table cells are
//! walked row by row. Drawings and text boxes anchored in a run are not body
//! text and never split the paragraph that hosts them.

use std::path::{Path, PathBuf};

use docx_rs::{
    read_docx, DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};
use thiserror::Error;
use tracing::debug;

/// Extensions accepted for résumé uploads (lowercase, without the dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["doc", "docx"];

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("unsupported file type: {0:?}")]
    UnsupportedFileType(String),

    #[error("failed to parse document: {0}")]
    Parse(String),
}

/// Returns `Ok(())` if `path` carries a supported document extension.
/// Never touches the filesystem.
pub fn ensure_supported(path: &Path) -> Result<(), DocumentError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(DocumentError::UnsupportedFileType(ext))
    }
}

/// Extracts plain paragraph text from a `.doc`/`.docx` file.
///
/// The extension is validated before the file is opened, so unsupported
/// files fail fast with `UnsupportedFileType` even if they do not exist.
/// Legacy binary `.doc` files are not WordprocessingML and fail with `Parse`.
pub fn extract_text(path: &Path) -> Result<String, DocumentError> {
    ensure_supported(path)?;

    if !path.exists() {
        return Err(DocumentError::FileNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path).map_err(|e| DocumentError::Parse(e.to_string()))?;
    let docx = read_docx(&bytes)
        .map_err(|e| DocumentError::Parse(format!("not a word document: {e}")))?;

    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => push_paragraph(&mut text, p),
            DocumentChild::Table(t) => push_table(&mut text, t),
            _ => {}
        }
    }

    debug!(
        "Extracted {} chars from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

fn push_paragraph(out: &mut String, paragraph: &Paragraph) {
    push_runs(out, &paragraph.children);
    out.push('\n');
}

/// Concatenates the text of runs, looking through hyperlinks.
fn push_runs(out: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    if let RunChild::Text(t) = run_child {
                        out.push_str(&t.text);
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_runs(out, &link.children),
            _ => {}
        }
    }
}

fn push_table(out: &mut String, table: &Table) {
    for TableChild::TableRow(row) in &table.rows {
        for TableRowChild::TableCell(cell) in &row.cells {
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(p) => push_paragraph(out, p),
                    TableCellContent::Table(t) => push_table(out, t),
                    _ => {}
                }
            }
        }
    }
}
