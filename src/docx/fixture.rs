//! Builds small `.docx` archives for tests.

use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading4"><w:name w:val="heading 4"/><w:basedOn w:val="Normal"/><w:rPr><w:b/></w:rPr></w:style>
  <w:style w:type="character" w:styleId="13ptBold"><w:name w:val="13 pt Bold"/><w:rPr><w:b/></w:rPr></w:style>
  <w:style w:type="character" w:styleId="StyleUnderline"><w:name w:val="Style Underline"/><w:rPr><w:u w:val="single"/></w:rPr></w:style>
  <w:style w:type="character" w:styleId="Emphasis"><w:name w:val="Emphasis"/><w:basedOn w:val="StyleUnderline"/><w:rPr><w:b/></w:rPr></w:style>
</w:styles>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

#[derive(Debug, Clone, Copy)]
pub enum Fmt {
    Plain,
    Bold,
    Underline,
    Highlight,
    Emphasis,
}

#[derive(Debug, Clone, Default)]
pub struct DocxFixture {
    paragraphs: Vec<String>,
    styles: Option<String>,
}

impl DocxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default `word/styles.xml`.
    pub fn styles(mut self, xml: &str) -> Self {
        self.styles = Some(xml.to_string());
        self
    }

    pub fn tag(self, text: &str) -> Self {
        self.raw_paragraph(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading4"/></w:pPr>{}</w:p>"#,
            run_xml(text, Fmt::Plain)
        ))
    }

    pub fn cite(self, bold: &str, rest: &str) -> Self {
        self.raw_paragraph(&format!(
            r#"<w:p><w:r><w:rPr><w:rStyle w:val="13ptBold"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>{}</w:p>"#,
            escape(bold),
            run_xml(rest, Fmt::Plain)
        ))
    }

    pub fn body(self, runs: &[(&str, Fmt)]) -> Self {
        let inner: String = runs.iter().map(|(t, f)| run_xml(t, *f)).collect();
        self.raw_paragraph(&format!("<w:p>{inner}</w:p>"))
    }

    pub fn plain(self, text: &str) -> Self {
        self.body(&[(text, Fmt::Plain)])
    }

    /// A tag, cite and one formatted body paragraph.
    pub fn card(self, tag: &str) -> Self {
        self.tag(tag).cite("Author 24", ", Journal").body(&[
            ("The ", Fmt::Plain),
            ("key claim", Fmt::Highlight),
            (" is ", Fmt::Plain),
            ("proven.", Fmt::Emphasis),
        ])
    }

    pub fn raw_paragraph(mut self, xml: &str) -> Self {
        self.paragraphs.push(xml.to_string());
        self
    }

    pub fn document_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            self.paragraphs.concat()
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let document = self.document_xml();
        Self::archive(&[
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", PACKAGE_RELS_XML),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML),
            (STYLES_PART, self.styles.as_deref().unwrap_or(STYLES_XML)),
            (DOCUMENT_PART, &document),
        ])
    }

    pub fn write(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).unwrap();
    }

    /// Zip arbitrary parts, for malformed-archive cases.
    pub fn archive(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, body) in parts {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

fn run_xml(text: &str, fmt: Fmt) -> String {
    let rpr = match fmt {
        Fmt::Plain => "",
        Fmt::Bold => "<w:rPr><w:b/></w:rPr>",
        Fmt::Underline => r#"<w:rPr><w:rStyle w:val="StyleUnderline"/></w:rPr>"#,
        Fmt::Highlight => {
            r#"<w:rPr><w:rStyle w:val="StyleUnderline"/><w:highlight w:val="cyan"/></w:rPr>"#
        }
        Fmt::Emphasis => r#"<w:rPr><w:rStyle w:val="Emphasis"/></w:rPr>"#,
    };
    format!(
        r#"<w:r>{rpr}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
