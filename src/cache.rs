//! Incremental processing: content digests, the prior-run skip set, and the
//! per-file checkpoint.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::card::Card;
use crate::output::{self, PriorRun};

/// Lowercase hex MD5 of a file's raw bytes.
pub fn content_digest(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Digests of files a prior run already emitted. Built once, read-only afterwards.
#[derive(Debug, Default)]
pub struct SkipSet(HashSet<String>);

impl SkipSet {
    pub fn from_prior(prior: &PriorRun) -> Self {
        SkipSet(prior.digests().clone())
    }

    pub fn contains(&self, digest: &str) -> bool {
        self.0.contains(digest)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Snapshot of every card produced so far in this run, rewritten after each file.
///
/// Same line format as the final output, so a checkpoint can be handed back in
/// as the previous run. Its cards are not normalized yet.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<output>.checkpoint` next to the output file.
    pub fn beside(output: &Path) -> Self {
        let mut name = output.as_os_str().to_owned();
        name.push(".checkpoint");
        Self::new(name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, cards: &[Card]) -> Result<()> {
        output::write_cards(&self.path, cards)?;
        Ok(())
    }
}

/// Stamp one file's cards with its digest and their 1-based position in the file.
pub fn assign_file_metadata(cards: &mut [Card], digest: &str) {
    for (idx, card) in cards.iter_mut().enumerate() {
        card.additional_info.order = Some(idx + 1);
        card.additional_info.md5sum = Some(digest.to_string());
    }
}
