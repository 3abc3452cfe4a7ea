//! JSON-lines persistence: final output, checkpoints, and prior-run input.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::card::Card;
use crate::parser::normalize_card;

/// A previous run's output, kept line-for-line so it can be re-emitted verbatim.
///
/// Records that are not in final form yet (a checkpoint handed in as the
/// previous run) are normalized on load; every other line keeps its exact bytes.
#[derive(Debug, Default)]
pub struct PriorRun {
    /// Raw lines with their terminators.
    lines: Vec<String>,
    records: usize,
    renormalized: usize,
    digests: HashSet<String>,
}

impl PriorRun {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let mut reader = BufReader::new(file);
        let mut prior = PriorRun::default();
        let mut raw = Vec::new();
        for line_no in 1.. {
            let n = reader
                .read_until(b'\n', &mut raw)
                .with_context(|| format!("Failed to read {:?}", path))?;
            if n == 0 {
                break;
            }
            let line = String::from_utf8(std::mem::take(&mut raw))
                .with_context(|| format!("{:?} line {}: not UTF-8", path, line_no))?;
            if line.trim().is_empty() {
                prior.lines.push(line);
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(&line)
                .with_context(|| format!("{:?} line {}: not a JSON record", path, line_no))?;
            if let Some(digest) = value
                .pointer("/additional_info/md5sum")
                .and_then(|v| v.as_str())
            {
                prior.digests.insert(digest.to_string());
            }
            prior.records += 1;
            match renormalize(value) {
                Some(fixed) => {
                    prior.renormalized += 1;
                    prior.lines.push(fixed);
                }
                None => prior.lines.push(line),
            }
        }
        Ok(prior)
    }

    /// Number of records, blank lines excluded.
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn renormalized(&self) -> usize {
        self.renormalized
    }

    pub fn digests(&self) -> &HashSet<String> {
        &self.digests
    }
}

/// The normalized line for a card record that normalization would change.
/// Lines that are already final, or are not card records, yield `None`.
fn renormalize(value: serde_json::Value) -> Option<String> {
    let original: Card = serde_json::from_value(value).ok()?;
    let mut card = original.clone();
    if let Some(mismatch) = normalize_card(&mut card) {
        warn!("{}", mismatch);
    }
    if card == original {
        return None;
    }
    let mut line = serde_json::to_string(&card).ok()?;
    line.push('\n');
    Some(line)
}

/// Prior records first, verbatim, then the new cards. Returns the record count.
pub fn merge_and_write(path: &Path, prior: Option<&PriorRun>, cards: &[Card]) -> Result<usize> {
    write_atomic(path, |w| {
        let mut written = 0;
        if let Some(prior) = prior {
            for line in &prior.lines {
                w.write_all(line.as_bytes())?;
                if !line.ends_with('\n') {
                    w.write_all(b"\n")?;
                }
            }
            written += prior.records;
        }
        written += write_cards_to(w, cards)?;
        Ok(written)
    })
}

pub fn write_cards(path: &Path, cards: &[Card]) -> Result<usize> {
    write_atomic(path, |w| write_cards_to(w, cards))
}

pub fn read_cards(path: &Path) -> Result<Vec<Card>> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut cards = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {:?}", path))?;
        if line.trim().is_empty() {
            continue;
        }
        let card = serde_json::from_str(&line)
            .with_context(|| format!("{:?} line {}: not a card record", path, idx + 1))?;
        cards.push(card);
    }
    Ok(cards)
}

fn write_cards_to(w: &mut dyn Write, cards: &[Card]) -> Result<usize> {
    for card in cards {
        serde_json::to_writer(&mut *w, card)?;
        w.write_all(b"\n")?;
    }
    Ok(cards.len())
}

/// Write to `<path>.tmp`, then rename over `path`, so readers never see a partial file.
fn write_atomic<T>(path: &Path, body: impl FnOnce(&mut dyn Write) -> Result<T>) -> Result<T> {
    if path.is_dir() {
        bail!("{:?} is a directory", path);
    }
    let tmp = tmp_path(path);
    let file = File::create(&tmp).with_context(|| format!("Failed to create {:?}", tmp))?;
    let mut writer = BufWriter::new(file);
    let out = body(&mut writer)?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())?
        .sync_all()?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move {:?} into place", tmp))?;
    Ok(out)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
