//! End-to-end runs: parse a directory, recover a checkpoint, summarize a file.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::batch::{self, BatchOptions, BatchReport};
use crate::cache::{Checkpoint, SkipSet};
use crate::card::RunCardBuilder;
use crate::config::Settings;
use crate::output::{self, PriorRun};
use crate::parser::{check_lengths, normalize_all, TrailingPolicy};

#[derive(Debug, Clone)]
pub struct ParseJob {
    pub directory: PathBuf,
    pub output: PathBuf,
    pub previous: Option<PathBuf>,
    /// Defaults to `<output>.checkpoint`.
    pub checkpoint: Option<PathBuf>,
    pub trailing: TrailingPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub batch: BatchReport,
    pub prior_records: usize,
    pub mismatches: usize,
    pub written: usize,
}

impl Summary {
    pub fn print(&self) {
        self.batch.print();
        if self.mismatches > 0 {
            println!("{} cards have misaligned run/label arrays.", self.mismatches);
        }
        println!(
            "Wrote {} records ({} carried over from the previous run).",
            self.written, self.prior_records
        );
    }
}

pub fn run(job: &ParseJob, settings: &Settings) -> Result<Summary> {
    // Argument problems are the only fatal errors, so check them before touching any document.
    if !job.directory.is_dir() {
        bail!("Expected a directory: {:?}", job.directory);
    }
    let checkpoint = match &job.checkpoint {
        Some(path) => Checkpoint::new(path),
        None => Checkpoint::beside(&job.output),
    };
    if let Some(prev) = &job.previous {
        if !prev.is_file() {
            bail!("Previous output not found: {:?}", prev);
        }
        if resolved(prev) == resolved(checkpoint.path()) {
            bail!(
                "Checkpoint {:?} would overwrite the previous output; pass a different --checkpoint",
                prev
            );
        }
    }
    let prior = job.previous.as_deref().map(PriorRun::load).transpose()?;
    let skip = prior.as_ref().map(SkipSet::from_prior).unwrap_or_default();
    if let Some(p) = &prior {
        if p.is_empty() {
            warn!("Previous output {:?} has no records", job.previous);
        } else if skip.is_empty() {
            warn!("{} previous records carry no md5sum; nothing will be skipped", p.len());
        } else {
            info!("Loaded {} previous records covering {} files", p.len(), skip.len());
        }
        if p.renormalized() > 0 {
            info!("Normalized {} previous records that were not in final form", p.renormalized());
        }
    }

    let sources = batch::discover(&job.directory, &settings.extension)?;
    println!("Found {} documents in {:?}", sources.len(), job.directory);

    let builder = RunCardBuilder::new(settings);
    let opts = BatchOptions {
        boundary_style: &settings.tag_style,
        trailing: job.trailing,
        builder: &builder,
    };
    let (mut cards, report) = batch::run_batch(&sources, &skip, &opts, &checkpoint)?;

    let mismatches = normalize_all(&mut cards);
    let written = output::merge_and_write(&job.output, prior.as_ref(), &cards)?;

    Ok(Summary {
        batch: report,
        prior_records: prior.as_ref().map(PriorRun::len).unwrap_or(0),
        mismatches,
        written,
    })
}

/// `path` with `..` and symlinks resolved. A file that does not exist yet is
/// resolved through its parent directory.
fn resolved(path: &Path) -> PathBuf {
    if let Ok(full) = fs::canonicalize(path) {
        return full;
    }
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Normalize a checkpoint into final-output form.
pub fn recover(checkpoint: &Path, output_path: &Path) -> Result<usize> {
    let mut cards = output::read_cards(checkpoint)?;
    let mismatches = normalize_all(&mut cards);
    if mismatches > 0 {
        println!("{} cards have misaligned run/label arrays.", mismatches);
    }
    output::write_cards(output_path, &cards)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileStats {
    pub cards: usize,
    pub files: usize,
    pub per_category: BTreeMap<String, usize>,
    pub mismatches: usize,
}

impl FileStats {
    pub fn print(&self) {
        println!("Cards:      {}", self.cards);
        println!("Files:      {}", self.files);
        println!("Mismatched: {}", self.mismatches);
        for (category, n) in &self.per_category {
            println!("  {:<24} {:>6}", category, n);
        }
    }
}

pub fn stats(path: &Path) -> Result<FileStats> {
    let cards = output::read_cards(path)?;
    let mut stats = FileStats {
        cards: cards.len(),
        ..Default::default()
    };
    let mut files = BTreeSet::new();
    for card in &cards {
        let info = &card.additional_info;
        *stats
            .per_category
            .entry(info.camp_or_other_source.clone())
            .or_default() += 1;
        files.insert(info.md5sum.clone().unwrap_or_else(|| info.filename.clone()));
        if check_lengths(card).is_some() {
            stats.mismatches += 1;
        }
    }
    stats.files = files.len();
    Ok(stats)
}
