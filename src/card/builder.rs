use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::{AdditionalInfo, Card};
use crate::config::Settings;
use crate::docx::{Paragraph, Run};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Why a paragraph buffer could not become a card.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("empty paragraph buffer")]
    Empty,
    #[error("buffer starts with a '{0}' paragraph, not a tag")]
    MissingTag(String),
    #[error("tag paragraph has no text")]
    BlankTag,
    #[error("card '{0}' has no cite")]
    MissingCite(String),
    #[error("card '{0}' has no body text")]
    EmptyBody(String),
}

/// Turns one card's paragraphs (tag first) into a `Card`.
pub trait CardBuilder {
    fn build(&self, paragraphs: &[Paragraph], info: &AdditionalInfo) -> Result<Card, CardError>;
}

/// Builds cards from run-level formatting: highlight, underline, and emphasis style.
#[derive(Debug, Clone)]
pub struct RunCardBuilder {
    tag_style: String,
    cite_style: String,
    emphasis_style: String,
}

impl RunCardBuilder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            tag_style: settings.tag_style.clone(),
            cite_style: settings.cite_style.clone(),
            emphasis_style: settings.emphasis_style.clone(),
        }
    }

    fn is_cite_emphasis(&self, run: &Run) -> bool {
        run.bold || run.style.as_deref() == Some(self.cite_style.as_str())
    }

    fn is_emphasis(&self, run: &Run) -> bool {
        run.style
            .as_deref()
            .is_some_and(|s| s.contains(self.emphasis_style.as_str()))
    }
}

impl CardBuilder for RunCardBuilder {
    fn build(&self, paragraphs: &[Paragraph], info: &AdditionalInfo) -> Result<Card, CardError> {
        let (head, rest) = paragraphs.split_first().ok_or(CardError::Empty)?;
        if head.style != self.tag_style {
            return Err(CardError::MissingTag(head.style.clone()));
        }
        let tag = collapse_ws(&head.text());
        if tag.is_empty() {
            return Err(CardError::BlankTag);
        }

        let mut content = rest.iter().filter(|p| !p.is_blank());
        let cite_para = content
            .next()
            .ok_or_else(|| CardError::MissingCite(tag.clone()))?;
        let body: Vec<&Paragraph> = content.collect();
        if body.is_empty() {
            return Err(CardError::EmptyBody(tag));
        }

        let cite = collapse_ws(&cite_para.text());
        let cite_emphasis = spans(cite_para, |r| self.is_cite_emphasis(r))
            .iter()
            .map(|s| collapse_ws(s))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let card_text = body
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n");

        let runs = body.iter().flat_map(|p| p.runs.iter());
        let mut card = Card {
            tag,
            card_text,
            cite,
            cite_emphasis,
            additional_info: info.clone(),
            ..Default::default()
        };
        for run in runs {
            card.run_text.push(run.text.clone());
            card.highlight_labels.push(run.highlight);
            card.underline_labels.push(run.underline);
            card.emphasis_labels.push(self.is_emphasis(run));
        }
        card.highlighted_text = words(&body, |r| r.highlight);
        card.underlined_text = words(&body, |r| r.underline);
        card.emphasized_text = words(&body, |r| self.is_emphasis(r));
        Ok(card)
    }
}

fn collapse_ws(s: &str) -> String {
    WS_RE.replace_all(s.trim(), " ").into_owned()
}

/// Concatenated text of each maximal run of consecutive matching runs.
fn spans(paragraph: &Paragraph, flagged: impl Fn(&Run) -> bool) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Option<String> = None;
    for run in &paragraph.runs {
        if flagged(run) {
            current.get_or_insert_with(String::new).push_str(&run.text);
        } else if let Some(span) = current.take() {
            out.push(span);
        }
    }
    out.extend(current);
    out
}

/// Whole words carried by flagged spans, so a word split across runs stays whole.
fn words(body: &[&Paragraph], flagged: impl Fn(&Run) -> bool) -> Vec<String> {
    body.iter()
        .flat_map(|p| spans(p, &flagged))
        .flat_map(|span| {
            span.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixture::{DocxFixture, Fmt};
    use crate::docx::Document;

    fn builder() -> RunCardBuilder {
        RunCardBuilder::new(&Settings::default())
    }

    fn paragraphs(fixture: DocxFixture) -> Vec<Paragraph> {
        Document::from_bytes(&fixture.to_bytes()).unwrap().paragraphs
    }

    fn info() -> AdditionalInfo {
        AdditionalInfo {
            filename: "neg/file.docx".into(),
            camp_or_other_source: "Neg".into(),
            ..Default::default()
        }
    }

    #[test]
    fn builds_card_from_formatted_runs() {
        let paras = paragraphs(
            DocxFixture::new()
                .tag("  Warming   is real ")
                .cite("Hansen 19", ", NASA scientist")
                .body(&[
                    ("We ", Fmt::Plain),
                    ("must act", Fmt::Highlight),
                    (" now", Fmt::Underline),
                    ("", Fmt::Plain),
                ])
                .body(&[("Emphatically ", Fmt::Emphasis), ("so.", Fmt::Plain)]),
        );
        let card = builder().build(&paras, &info()).unwrap();
        assert_eq!(card.tag, "Warming is real");
        assert_eq!(card.cite, "Hansen 19, NASA scientist");
        assert_eq!(card.cite_emphasis, "Hansen 19");
        assert_eq!(card.card_text, "We must act now\nEmphatically so.");
        assert_eq!(card.run_text, vec!["We ", "must act", " now", "", "Emphatically ", "so."]);
        assert_eq!(card.highlight_labels, vec![false, true, false, false, false, false]);
        assert_eq!(card.underline_labels, vec![false, true, true, false, true, false]);
        assert_eq!(card.emphasis_labels, vec![false, false, false, false, true, false]);
        assert_eq!(card.highlighted_text, vec!["must", "act"]);
        assert_eq!(card.underlined_text, vec!["must", "act", "now", "Emphatically"]);
        assert_eq!(card.emphasized_text, vec!["Emphatically"]);
        assert_eq!(card.additional_info, info());
    }

    #[test]
    fn word_split_across_runs_stays_whole() {
        let paras = paragraphs(
            DocxFixture::new()
                .tag("Tag")
                .cite("Cite", "")
                .body(&[("hyper", Fmt::Highlight), ("text here", Fmt::Highlight)]),
        );
        let card = builder().build(&paras, &info()).unwrap();
        assert_eq!(card.highlighted_text, vec!["hypertext", "here"]);
    }

    #[test]
    fn blank_paragraphs_are_skipped_before_cite() {
        let paras = paragraphs(
            DocxFixture::new()
                .tag("Tag")
                .plain("   ")
                .cite("Cite", "")
                .plain("body"),
        );
        let card = builder().build(&paras, &info()).unwrap();
        assert_eq!(card.cite, "Cite");
        assert_eq!(card.card_text, "body");
    }

    #[test]
    fn rejects_degenerate_buffers() {
        let b = builder();
        assert_eq!(b.build(&[], &info()).unwrap_err(), CardError::Empty);

        let no_tag = paragraphs(DocxFixture::new().plain("body"));
        assert_eq!(
            b.build(&no_tag, &info()).unwrap_err(),
            CardError::MissingTag("Normal".into())
        );

        let blank_tag = paragraphs(DocxFixture::new().tag(" ").cite("c", "").plain("b"));
        assert_eq!(b.build(&blank_tag, &info()).unwrap_err(), CardError::BlankTag);

        let no_cite = paragraphs(DocxFixture::new().tag("Lonely"));
        assert_eq!(
            b.build(&no_cite, &info()).unwrap_err(),
            CardError::MissingCite("Lonely".into())
        );

        let no_body = paragraphs(DocxFixture::new().tag("Short").cite("c", ""));
        assert_eq!(
            b.build(&no_body, &info()).unwrap_err(),
            CardError::EmptyBody("Short".into())
        );
    }
}
