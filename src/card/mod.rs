pub mod builder;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use builder::{CardBuilder, RunCardBuilder};

/// Provenance attached to every card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    pub filename: String,
    pub camp_or_other_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5sum: Option<String>,
    /// 1-based position of the card within its source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<usize>,
    /// Keys written by other tools are carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One excerpted argument unit. Field order is the output column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub tag: String,
    #[serde(rename = "text")]
    pub card_text: String,
    #[serde(rename = "highlights")]
    pub highlighted_text: Vec<String>,
    #[serde(rename = "underlines")]
    pub underlined_text: Vec<String>,
    #[serde(rename = "emphasis")]
    pub emphasized_text: Vec<String>,
    pub cite: String,
    pub cite_emphasis: String,
    pub run_text: Vec<String>,
    pub highlight_labels: Vec<bool>,
    pub underline_labels: Vec<bool>,
    pub emphasis_labels: Vec<bool>,
    pub additional_info: AdditionalInfo,
}
