//! Placeholder substitution
//!
//! `${name}` tokens are replaced inside the `w:t` text nodes of every
//! paragraph whose text contains `${`. Replacement is local to one text
//! node: a placeholder whose characters are split across runs (Word splits
//! runs wherever formatting, spell-check or revision marks change) is left
//! as literal text.
//!
//! Paragraphs without `${` and every element outside the rewritten text
//! nodes are written back unchanged, so run formatting, drawings and fields
//! survive substitution.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::docx::{DocxError, DocxPackage, Result};

use super::types::{GeneratedDocument, Row};

/// Marks the start of a placeholder
const PLACEHOLDER_OPEN: &str = "${";

/// A parsed template, good for rendering exactly one row
pub struct Template {
    package: DocxPackage,
}

impl Template {
    /// Parse a template from `.docx` bytes
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            package: DocxPackage::from_bytes(bytes)?,
        })
    }

    /// Substitute `row` into the template and serialize the result
    ///
    /// Consumes the template: the next row gets a fresh parse.
    pub fn render(mut self, row: &Row) -> Result<GeneratedDocument> {
        let xml = substitute_document_xml(
            self.package.main_document_name(),
            self.package.main_document_xml()?,
            row,
        )?;
        self.package.set_main_document_xml(xml);

        Ok(GeneratedDocument::new(self.package.to_bytes()?))
    }
}

/// Replace every `${key}` in `text`, one key at a time in column order
pub fn substitute_placeholders<'a>(text: &'a str, row: &Row) -> Cow<'a, str> {
    if !text.contains(PLACEHOLDER_OPEN) {
        return Cow::Borrowed(text);
    }

    let mut result = Cow::Borrowed(text);
    for (key, value) in row.iter() {
        let placeholder = format!("${{{}}}", key);
        if result.contains(placeholder.as_str()) {
            result = Cow::Owned(result.replace(placeholder.as_str(), value));
        }
    }
    result
}

enum Boundary {
    ParagraphStart,
    ParagraphEnd,
    Eof,
    Other,
}

fn boundary(event: &Event) -> Boundary {
    match event {
        Event::Start(e) if e.name().as_ref() == b"w:p" => Boundary::ParagraphStart,
        Event::End(e) if e.name().as_ref() == b"w:p" => Boundary::ParagraphEnd,
        Event::Eof => Boundary::Eof,
        _ => Boundary::Other,
    }
}

/// `Some(true)` entering a `w:t`, `Some(false)` leaving one
fn text_node_boundary(event: &Event) -> Option<bool> {
    match event {
        Event::Start(e) if e.name().as_ref() == b"w:t" => Some(true),
        Event::End(e) if e.name().as_ref() == b"w:t" => Some(false),
        _ => None,
    }
}

/// Rewrite the main document XML with `row` substituted
///
/// Outermost `w:p` elements are buffered whole (text boxes nest paragraphs
/// inside runs), everything else streams straight through.
pub fn substitute_document_xml(part_name: &str, xml: &[u8], row: &Row) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    let mut paragraph: Vec<Event<'static>> = Vec::new();
    let mut depth = 0usize;

    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| DocxError::xml(part_name, e))?;

        match boundary(&event) {
            Boundary::Eof => break,
            Boundary::ParagraphStart => {
                depth += 1;
                paragraph.push(event.into_owned());
            }
            Boundary::ParagraphEnd if depth > 0 => {
                depth -= 1;
                paragraph.push(event.into_owned());
                if depth == 0 {
                    write_paragraph(&mut writer, std::mem::take(&mut paragraph), row, part_name)?;
                }
            }
            _ if depth > 0 => paragraph.push(event.into_owned()),
            _ => writer
                .write_event(event)
                .map_err(|e| DocxError::xml(part_name, e))?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

/// Concatenated `w:t` text of a buffered paragraph
fn paragraph_text(events: &[Event<'static>], part_name: &str) -> Result<String> {
    let mut text = String::new();
    let mut in_text = false;

    for event in events {
        if let Some(entering) = text_node_boundary(event) {
            in_text = entering;
        } else if let (true, Event::Text(t)) = (in_text, event) {
            text.push_str(&t.unescape().map_err(|e| DocxError::xml(part_name, e))?);
        }
    }

    Ok(text)
}

fn write_paragraph(
    writer: &mut Writer<Vec<u8>>,
    events: Vec<Event<'static>>,
    row: &Row,
    part_name: &str,
) -> Result<()> {
    let rewrite = paragraph_text(&events, part_name)?.contains(PLACEHOLDER_OPEN);
    let mut output: Vec<Event<'static>> = Vec::with_capacity(events.len());
    // Position in `output` of the open `w:t` start tag
    let mut text_start: Option<usize> = None;

    for event in events {
        match text_node_boundary(&event) {
            Some(true) => text_start = Some(output.len()),
            Some(false) => text_start = None,
            None => {}
        }

        let event = match (event, text_start) {
            (Event::Text(t), Some(start)) if rewrite => {
                let replaced = {
                    let original = t.unescape().map_err(|e| DocxError::xml(part_name, e))?;
                    match substitute_placeholders(&original, row) {
                        Cow::Owned(s) => Some(s),
                        Cow::Borrowed(_) => None,
                    }
                };
                match replaced {
                    Some(s) => {
                        if has_edge_whitespace(&s) {
                            preserve_space(&mut output[start]);
                        }
                        Event::Text(BytesText::new(&s).into_owned())
                    }
                    None => Event::Text(t),
                }
            }
            (other, _) => other,
        };
        output.push(event);
    }

    for event in output {
        writer
            .write_event(event)
            .map_err(|e| DocxError::xml(part_name, e))?;
    }

    Ok(())
}

fn has_edge_whitespace(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// Mark a `w:t` start tag with `xml:space="preserve"` unless it already is
fn preserve_space(event: &mut Event<'static>) {
    if let Event::Start(start) = event {
        let preserved = start
            .attributes()
            .flatten()
            .any(|attr| attr.key.as_ref() == b"xml:space" && attr.value.as_ref() == b"preserve");
        if !preserved {
            let attrs: Vec<(Vec<u8>, Vec<u8>)> = start
                .attributes()
                .flatten()
                .filter(|attr| attr.key.as_ref() != b"xml:space")
                .map(|attr| (attr.key.as_ref().to_vec(), attr.value.into_owned()))
                .collect();
            let mut tag = BytesStart::new("w:t");
            for (key, value) in &attrs {
                tag.push_attribute((key.as_slice(), value.as_slice()));
            }
            tag.push_attribute(("xml:space", "preserve"));
            *start = tag.into_owned();
        }
    }
}
