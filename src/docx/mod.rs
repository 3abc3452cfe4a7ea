//! `.docx` reading on top of `docx-rs`: paragraphs, their style names, and
//! per-run formatting with character styles resolved.
//!
//! Only body paragraphs are kept. Tables, content controls and text boxes are
//! skipped.

pub mod styles;

#[cfg(test)]
pub mod fixture;

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use thiserror::Error;

use styles::{val_of, RunProps, StyleSheet};

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("unreadable docx: {0}")]
    Read(#[from] docx_rs::ReaderError),
    #[error("unexpected docx model: {0}")]
    Model(#[from] serde_json::Error),
}

/// A contiguous span of text sharing one formatting state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub underline: bool,
    pub highlight: bool,
    /// Display name of the run's character style, if any.
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Display name of the paragraph style ("Heading 4", "Normal", ...).
    pub style: String,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    /// Parse a `.docx` archive held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let docx = docx_rs::read_docx(bytes)?;
        let styles = StyleSheet::from_styles(&docx.styles)?;
        let mut paragraphs = Vec::new();
        for child in &docx.document.children {
            if let DocumentChild::Paragraph(p) = child {
                paragraphs.push(read_paragraph(p, &styles)?);
            }
        }
        Ok(Document { paragraphs })
    }
}

fn read_paragraph(p: &docx_rs::Paragraph, styles: &StyleSheet) -> Result<Paragraph, DocxError> {
    let ppr = serde_json::to_value(&p.property)?;
    let style_id = ppr.get("style").and_then(val_of);
    let mut runs = Vec::new();
    collect_runs(&p.children, styles, &mut runs)?;
    Ok(Paragraph {
        style: styles.paragraph_name(style_id.as_deref()),
        runs,
    })
}

fn collect_runs(
    children: &[ParagraphChild],
    styles: &StyleSheet,
    out: &mut Vec<Run>,
) -> Result<(), DocxError> {
    for child in children {
        match child {
            ParagraphChild::Run(run) => out.push(read_run(run, styles)?),
            ParagraphChild::Hyperlink(link) => collect_runs(&link.children, styles, out)?,
            _ => {}
        }
    }
    Ok(())
}

/// Direct formatting wins over the character style, which wins over "off".
fn read_run(run: &docx_rs::Run, styles: &StyleSheet) -> Result<Run, DocxError> {
    let rpr = serde_json::to_value(&run.run_property)?;
    let style_id = rpr.get("style").and_then(val_of);
    let inherited = style_id
        .as_deref()
        .map(|id| styles.run_props(id))
        .unwrap_or_default();
    let props = RunProps::from_json(&rpr).or(inherited);

    let mut text = String::new();
    for child in &run.children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }

    Ok(Run {
        text,
        bold: props.bold.unwrap_or(false),
        underline: props.underline.unwrap_or(false),
        highlight: props.highlight.unwrap_or(false),
        style: style_id.map(|id| styles.name_of(&id)),
    })
}
