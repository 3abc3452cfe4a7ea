use std::fmt;

use tracing::warn;

use crate::card::Card;

/// Trimmed from both ends of every highlight/underline/emphasis token.
const EDGE_PUNCTUATION: &[char] = &[
    ',', '.', '!', '?', ':', ';', '(', ')', '[', ']', '{', '}', '"', '\'', '\u{201C}', '\u{201D}',
    '\u{2018}', '\u{2019}',
];

/// `run_text` and its label arrays disagree in length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthMismatch {
    pub tag: String,
    pub run_text: usize,
    pub highlight_labels: usize,
    pub underline_labels: usize,
    pub emphasis_labels: usize,
}

impl fmt::Display for LengthMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error parsing {}: run_text length {} does not match highlight/underline/emphasis lengths {}/{}/{}",
            self.tag, self.run_text, self.highlight_labels, self.underline_labels, self.emphasis_labels
        )
    }
}

/// Normalize every card in place. Returns how many failed the length check.
pub fn normalize_all(cards: &mut [Card]) -> usize {
    let mut mismatches = 0;
    for card in cards.iter_mut() {
        if let Some(m) = normalize_card(card) {
            warn!("{}", m);
            mismatches += 1;
        }
    }
    mismatches
}

/// Clean one card. A length mismatch is reported, never repaired.
pub fn normalize_card(card: &mut Card) -> Option<LengthMismatch> {
    strip_tokens(&mut card.highlighted_text);
    strip_tokens(&mut card.underlined_text);
    strip_tokens(&mut card.emphasized_text);

    let mismatch = check_lengths(card);
    drop_empty_runs(card);

    card.card_text = plain_punctuation(&card.card_text);
    card.tag = plain_punctuation(&card.tag);
    for list in [
        &mut card.underlined_text,
        &mut card.highlighted_text,
        &mut card.emphasized_text,
        &mut card.run_text,
    ] {
        for token in list.iter_mut() {
            *token = plain_punctuation(token);
        }
    }
    mismatch
}

pub fn check_lengths(card: &Card) -> Option<LengthMismatch> {
    let n = card.run_text.len();
    let aligned = card.highlight_labels.len() == n
        && card.underline_labels.len() == n
        && card.emphasis_labels.len() == n;
    if aligned {
        return None;
    }
    Some(LengthMismatch {
        tag: card.tag.clone(),
        run_text: n,
        highlight_labels: card.highlight_labels.len(),
        underline_labels: card.underline_labels.len(),
        emphasis_labels: card.emphasis_labels.len(),
    })
}

fn strip_tokens(tokens: &mut Vec<String>) {
    *tokens = tokens
        .iter()
        .map(|t| t.trim_matches(EDGE_PUNCTUATION))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
}

/// Drop empty `run_text` entries and the labels at the same positions.
fn drop_empty_runs(card: &mut Card) {
    let keep: Vec<bool> = card.run_text.iter().map(|t| !t.is_empty()).collect();
    card.run_text.retain(|t| !t.is_empty());
    retain_by_mask(&mut card.highlight_labels, &keep);
    retain_by_mask(&mut card.underline_labels, &keep);
    retain_by_mask(&mut card.emphasis_labels, &keep);
}

/// Entries beyond the mask are kept so a mismatched card stays visibly mismatched.
fn retain_by_mask<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut idx = 0;
    values.retain(|_| {
        let k = keep.get(idx).copied().unwrap_or(true);
        idx += 1;
        k
    });
}

fn plain_punctuation(s: &str) -> String {
    s.replace(['\u{2018}', '\u{2019}'], "'").replace('\u{2014}', "-")
}
