//! Read-only view of a Word document
//!
//! Walks the main document part with quick-xml and collects what the preview
//! needs: paragraphs with their alignment, runs with text and bold/italic
//! flags, inline pictures per run, and every image the document references.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::{DocxError, Result};
use super::package::DocxPackage;

/// Paragraph alignment (`w:jc`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    fn from_jc(value: &str) -> Self {
        match value {
            "center" => Alignment::Center,
            "right" | "end" => Alignment::Right,
            "both" | "distribute" => Alignment::Justify,
            _ => Alignment::Left,
        }
    }
}

/// Image bytes referenced by the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    /// Part name of the image (e.g. `word/media/image1.png`)
    pub part_name: String,
    /// Raw image bytes; empty when the part is missing
    pub data: Vec<u8>,
}

/// A run of text sharing one set of formatting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    /// Concatenated `w:t` text, `None` when the run has no text element
    pub text: Option<String>,
    pub bold: bool,
    pub italic: bool,
    /// Pictures drawn inline in this run
    pub pictures: Vec<Picture>,
}

/// A paragraph and its runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Explicit alignment, `None` when the paragraph doesn't set `w:jc`
    pub alignment: Option<Alignment>,
    pub runs: Vec<Run>,
}

/// Parsed view of a document
#[derive(Debug, Clone, Default)]
pub struct WordDocument {
    pub paragraphs: Vec<Paragraph>,
    /// Every image related to the main document part, in relationship order
    pub pictures: Vec<Picture>,
}

impl WordDocument {
    /// Parse a document from `.docx` bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = DocxPackage::from_bytes(bytes)?;
        Self::from_package(&package)
    }

    /// Build the view from an already opened package
    pub fn from_package(package: &DocxPackage) -> Result<Self> {
        let relationships = package.document_relationships()?;

        let mut images: HashMap<String, Picture> = HashMap::new();
        let mut pictures = Vec::new();
        for rel in relationships.iter().filter(|r| r.is_image()) {
            let picture = Picture {
                part_name: rel.target.clone(),
                data: package.part(&rel.target).map(<[u8]>::to_vec).unwrap_or_default(),
            };
            images.insert(rel.id.clone(), picture.clone());
            pictures.push(picture);
        }

        let paragraphs = parse_paragraphs(package.main_document_name(), package.main_document_xml()?, &images)?;

        Ok(Self { paragraphs, pictures })
    }
}

fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Formatting toggles are on unless `w:val` says "0", "false" or "none"
fn toggle_on(e: &BytesStart) -> bool {
    !matches!(get_attr(e, b"w:val").as_deref(), Some("0" | "false" | "off" | "none"))
}

/// Walk state for `parse_paragraphs`
#[derive(Default)]
struct Walker {
    /// Nesting depth of `w:p` (text boxes nest paragraphs inside runs)
    p_depth: usize,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    in_ppr: bool,
    in_rpr: bool,
    in_text: bool,
    paragraphs: Vec<Paragraph>,
}

impl Walker {
    /// True while inside an outermost paragraph and outside nested ones
    fn at_top(&self) -> bool {
        self.p_depth == 1
    }

    fn element(&mut self, e: &BytesStart, empty: bool, images: &HashMap<String, Picture>) {
        match e.name().as_ref() {
            b"w:p" => {
                if empty {
                    if self.p_depth == 0 {
                        self.paragraphs.push(Paragraph::default());
                    }
                } else {
                    self.p_depth += 1;
                    if self.p_depth == 1 {
                        self.paragraph = Some(Paragraph::default());
                    }
                }
            }
            b"w:pPr" if self.at_top() && self.run.is_none() && !empty => self.in_ppr = true,
            b"w:jc" if self.in_ppr => {
                if let (Some(paragraph), Some(value)) = (self.paragraph.as_mut(), get_attr(e, b"w:val")) {
                    paragraph.alignment = Some(Alignment::from_jc(&value));
                }
            }
            b"w:r" if self.at_top() && !empty => self.run = Some(Run::default()),
            b"w:rPr" if self.at_top() && self.run.is_some() && !empty => self.in_rpr = true,
            b"w:b" if self.in_rpr => {
                if let Some(run) = self.run.as_mut() {
                    run.bold = toggle_on(e);
                }
            }
            b"w:i" if self.in_rpr => {
                if let Some(run) = self.run.as_mut() {
                    run.italic = toggle_on(e);
                }
            }
            b"w:t" if self.at_top() => {
                if let Some(run) = self.run.as_mut() {
                    run.text.get_or_insert_with(String::new);
                    self.in_text = !empty;
                }
            }
            b"a:blip" if self.p_depth >= 1 => {
                if let (Some(run), Some(rel_id)) = (self.run.as_mut(), get_attr(e, b"r:embed")) {
                    let picture = images.get(&rel_id).cloned().unwrap_or_else(|| Picture {
                        part_name: rel_id,
                        data: Vec::new(),
                    });
                    run.pictures.push(picture);
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:p" => {
                if self.p_depth == 1 {
                    if let Some(paragraph) = self.paragraph.take() {
                        self.paragraphs.push(paragraph);
                    }
                }
                self.p_depth = self.p_depth.saturating_sub(1);
            }
            b"w:pPr" if self.at_top() => self.in_ppr = false,
            b"w:rPr" if self.at_top() => self.in_rpr = false,
            b"w:t" if self.at_top() => self.in_text = false,
            b"w:r" if self.at_top() => {
                if let (Some(paragraph), Some(run)) = (self.paragraph.as_mut(), self.run.take()) {
                    paragraph.runs.push(run);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_text {
            if let Some(run) = self.run.as_mut() {
                run.text.get_or_insert_with(String::new).push_str(text);
            }
        }
    }
}

fn parse_paragraphs(part_name: &str, xml: &[u8], images: &HashMap<String, Picture>) -> Result<Vec<Paragraph>> {
    let mut reader = Reader::from_reader(xml);
    let mut walker = Walker::default();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => walker.element(&e, false, images),
            Ok(Event::Empty(e)) => walker.element(&e, true, images),
            Ok(Event::End(e)) => walker.end(e.name().as_ref()),
            Ok(Event::Text(t)) => {
                if walker.in_text {
                    let text = t.unescape().map_err(|e| DocxError::xml(part_name, e))?;
                    walker.text(&text);
                }
            }
            Ok(Event::CData(t)) => walker.text(&String::from_utf8_lossy(&t)),
            Ok(Event::Eof) => break,
            Err(e) => return Err(DocxError::xml(part_name, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.paragraphs)
}
