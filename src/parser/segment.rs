use tracing::debug;

use crate::card::{AdditionalInfo, Card, CardBuilder};
use crate::docx::Paragraph;

/// What happens to the buffer still open when the document ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingPolicy {
    /// The last card is emitted only if another boundary follows it.
    #[default]
    Drop,
    /// The open buffer is finalized as one more card.
    Flush,
}

#[derive(Debug, Default)]
pub struct Segmentation {
    pub cards: Vec<Card>,
    /// Buffers the builder refused.
    pub rejected: usize,
}

/// Split a document's paragraphs into cards at `boundary_style` paragraphs.
///
/// Each boundary closes the buffer opened by the previous boundary. Paragraphs
/// before the first boundary never reach the builder.
pub fn segment(
    paragraphs: &[Paragraph],
    boundary_style: &str,
    trailing: TrailingPolicy,
    builder: &dyn CardBuilder,
    info: &AdditionalInfo,
) -> Segmentation {
    let mut out = Segmentation::default();
    let mut open: Option<usize> = None;

    for (i, paragraph) in paragraphs.iter().enumerate() {
        if paragraph.style != boundary_style {
            continue;
        }
        if let Some(start) = open {
            finalize(&paragraphs[start..i], builder, info, &mut out);
        }
        open = Some(i);
    }

    if let (TrailingPolicy::Flush, Some(start)) = (trailing, open) {
        finalize(&paragraphs[start..], builder, info, &mut out);
    }
    out
}

fn finalize(
    buffer: &[Paragraph],
    builder: &dyn CardBuilder,
    info: &AdditionalInfo,
    out: &mut Segmentation,
) {
    match builder.build(buffer, info) {
        Ok(card) => out.cards.push(card),
        Err(e) => {
            debug!(file = %info.filename, error = %e, "Dropped card");
            out.rejected += 1;
        }
    }
}
