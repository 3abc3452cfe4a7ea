use std::collections::HashMap;

use serde_json::Value;

use super::DocxError;

const MAX_BASED_ON_DEPTH: usize = 16;
const DEFAULT_PARAGRAPH_STYLE: &str = "Normal";

/// Run-level toggles. `None` means "inherit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunProps {
    pub bold: Option<bool>,
    pub underline: Option<bool>,
    pub highlight: Option<bool>,
}

impl RunProps {
    /// Fill unset toggles from `base`.
    pub fn or(self, base: RunProps) -> RunProps {
        RunProps {
            bold: self.bold.or(base.bold),
            underline: self.underline.or(base.underline),
            highlight: self.highlight.or(base.highlight),
        }
    }

    /// Read the toggles from a serialized `docx_rs::RunProperty`.
    pub fn from_json(rpr: &Value) -> RunProps {
        RunProps {
            bold: rpr.get("bold").and_then(toggle),
            underline: rpr.get("underline").and_then(toggle),
            highlight: rpr.get("highlight").and_then(toggle),
        }
    }
}

/// `w:b` serializes as a bool; `w:u` and `w:highlight` as their `w:val`.
fn toggle(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(on) => Some(*on),
        Value::String(s) => Some(!matches!(s.as_str(), "none" | "0" | "false" | "off")),
        Value::Object(map) => map.get("val").and_then(toggle),
        _ => None,
    }
}

/// The string behind a serialized `w:val`-style element.
pub(crate) fn val_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map.get("val").or_else(|| map.get("name")).and_then(val_of),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
struct StyleDef {
    name: String,
    based_on: Option<String>,
    props: RunProps,
}

/// Style id → display name and character formatting.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, StyleDef>,
}

impl StyleSheet {
    pub fn from_styles(styles: &docx_rs::Styles) -> Result<Self, DocxError> {
        let mut sheet = StyleSheet::default();
        let all = serde_json::to_value(styles)?;
        let list = all.get("styles").and_then(Value::as_array);
        for v in list.into_iter().flatten() {
            let Some(id) = v.get("styleId").and_then(val_of) else {
                continue;
            };
            let def = StyleDef {
                name: v.get("name").and_then(val_of).map(|n| ui_name(&n)).unwrap_or_default(),
                based_on: v.get("basedOn").and_then(val_of),
                props: v.get("runProperty").map(RunProps::from_json).unwrap_or_default(),
            };
            sheet.styles.insert(id, def);
        }
        Ok(sheet)
    }

    /// Display name of a paragraph style; unstyled paragraphs are "Normal".
    pub fn paragraph_name(&self, id: Option<&str>) -> String {
        self.name_of(id.unwrap_or(DEFAULT_PARAGRAPH_STYLE))
    }

    /// Display name for a style id. Unknown ids are returned as-is.
    pub fn name_of(&self, id: &str) -> String {
        match self.styles.get(id) {
            Some(def) if !def.name.is_empty() => def.name.clone(),
            _ => id.to_string(),
        }
    }

    /// Formatting a character style contributes, following `basedOn`.
    pub fn run_props(&self, id: &str) -> RunProps {
        let mut props = RunProps::default();
        let mut next = Some(id);
        for _ in 0..MAX_BASED_ON_DEPTH {
            let Some(def) = next.and_then(|id| self.styles.get(id)) else {
                break;
            };
            props = props.or(def.props);
            next = def.based_on.as_deref();
        }
        props
    }
}

/// Word stores some built-in names in lowercase ("heading 4") but shows them capitalized.
fn ui_name(raw: &str) -> String {
    let builtin = raw.starts_with("heading ")
        || matches!(raw, "caption" | "header" | "footer" | "title" | "normal");
    if !builtin {
        return raw.to_string();
    }
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
