use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::cache::{assign_file_metadata, content_digest, Checkpoint, SkipSet};
use crate::card::{AdditionalInfo, Card, CardBuilder};
use crate::docx::{Document, DocxError};
use crate::parser::{segment, Segmentation, TrailingPolicy};

/// Category for documents sitting directly in the input root.
pub const ROOT_CATEGORY: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Name of the containing directory ("camp or other source").
    pub category: String,
}

/// List documents under `root`: loose files first, then one directory level,
/// both in name order.
pub fn discover(root: &Path, extension: &str) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        bail!("Expected a directory: {:?}", root);
    }

    let mut sources = Vec::new();
    let mut categories = Vec::new();
    for path in sorted_entries(root)? {
        if path.is_dir() {
            categories.push(path);
        } else if is_document(&path, extension) {
            sources.push(SourceFile {
                path,
                category: ROOT_CATEGORY.to_string(),
            });
        }
    }

    for dir in categories {
        let category = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        for path in sorted_entries(&dir)? {
            if path.is_dir() {
                warn!("Skipping nested directory {:?}", path);
            } else if is_document(&path, extension) {
                sources.push(SourceFile {
                    path,
                    category: category.clone(),
                });
            }
        }
    }
    Ok(sources)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {:?}", dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to list {:?}", dir))?;
    paths.sort();
    Ok(paths)
}

fn is_document(path: &Path, extension: &str) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    // Word leaves "~$name.docx" lock files next to open documents.
    if name.starts_with("~$") {
        debug!("Ignoring lock file {:?}", path);
        return false;
    }
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub files: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rejected: usize,
    pub cards: usize,
}

impl BatchReport {
    pub fn print(&self) {
        println!(
            "Files: {} ({} parsed, {} skipped as already processed, {} failed).",
            self.files, self.parsed, self.skipped, self.failed
        );
        println!(
            "Cards: {} new ({} buffers rejected by the card builder).",
            self.cards, self.rejected
        );
    }
}

pub struct BatchOptions<'a> {
    pub boundary_style: &'a str,
    pub trailing: TrailingPolicy,
    pub builder: &'a dyn CardBuilder,
}

/// Parse every source not in `skip`, one at a time, checkpointing after each.
///
/// A file that cannot be read or parsed is logged and contributes no cards.
pub fn run_batch(
    sources: &[SourceFile],
    skip: &SkipSet,
    opts: &BatchOptions,
    checkpoint: &Checkpoint,
) -> Result<(Vec<Card>, BatchReport)> {
    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut cards: Vec<Card> = Vec::new();
    let mut report = BatchReport {
        files: sources.len(),
        ..Default::default()
    };

    for source in sources {
        pb.set_message(source.category.clone());
        let bytes = match fs::read(&source.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Error reading {:?} from {}: {}", source.path, source.category, e);
                report.failed += 1;
                save_checkpoint(checkpoint, &cards);
                pb.inc(1);
                continue;
            }
        };

        let digest = content_digest(&bytes);
        if skip.contains(&digest) {
            debug!("Skipping {:?}: digest {} already processed", source.path, digest);
            report.skipped += 1;
            pb.inc(1);
            continue;
        }

        match parse_file(&bytes, source, &digest, opts) {
            Ok(seg) => {
                let mut produced = seg.cards;
                assign_file_metadata(&mut produced, &digest);
                info!("Parsed {} cards from {:?}", produced.len(), source.path);
                report.parsed += 1;
                report.rejected += seg.rejected;
                report.cards += produced.len();
                cards.extend(produced);
            }
            Err(e) => {
                warn!("Error parsing {:?} from {}: {}", source.path, source.category, e);
                report.failed += 1;
            }
        }
        save_checkpoint(checkpoint, &cards);
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok((cards, report))
}

fn parse_file(
    bytes: &[u8],
    source: &SourceFile,
    digest: &str,
    opts: &BatchOptions,
) -> Result<Segmentation, DocxError> {
    let document = Document::from_bytes(bytes)?;
    let info = AdditionalInfo {
        filename: source.path.display().to_string(),
        camp_or_other_source: source.category.clone(),
        md5sum: Some(digest.to_string()),
        ..Default::default()
    };
    Ok(segment(
        &document.paragraphs,
        opts.boundary_style,
        opts.trailing,
        opts.builder,
        &info,
    ))
}

fn save_checkpoint(checkpoint: &Checkpoint, cards: &[Card]) {
    if let Err(e) = checkpoint.save(cards) {
        warn!("Failed to write checkpoint {:?}: {:#}", checkpoint.path(), e);
    }
}
