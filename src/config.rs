use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Style names and file filters, overridable via `CARDS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Paragraph style that opens a new card.
    pub tag_style: String,
    /// Character style marking the emphasized part of a cite line.
    pub cite_style: String,
    /// Character style (substring match) marking emphasized runs.
    pub emphasis_style: String,
    /// Extension of documents to parse, without the dot.
    pub extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tag_style: "Heading 4".to_string(),
            cite_style: "13 pt Bold".to_string(),
            emphasis_style: "Emphasis".to_string(),
            extension: "docx".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let d = Settings::default();
        Config::builder()
            .set_default("tag_style", d.tag_style)?
            .set_default("cite_style", d.cite_style)?
            .set_default("emphasis_style", d.emphasis_style)?
            .set_default("extension", d.extension)?
            .add_source(Environment::with_prefix("CARDS"))
            .build()
            .context("Failed to read CARDS_* settings")?
            .try_deserialize()
            .context("Invalid CARDS_* settings")
    }
}
