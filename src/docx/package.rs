//! DOCX package access
//!
//! A `.docx` file is a ZIP container of XML parts. `DocxPackage` keeps every
//! part in memory, in archive order, so a template can be read, have its main
//! document part rewritten, and be written back without touching the rest of
//! the package.

use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use super::error::{DocxError, Result};

/// Package-level relationships part
const PACKAGE_RELS: &str = "_rels/.rels";

/// Main document part used when the package relationships don't name one
const DEFAULT_MAIN_DOCUMENT: &str = "word/document.xml";

/// Relationship type suffix of the main document part
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// Relationship type suffix of image parts
pub const IMAGE_REL: &str = "/image";

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

/// A relationship entry from a `.rels` part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g. "rId7")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target part name, resolved against the source part
    pub target: String,
    /// Whether the target lives outside the package (TargetMode="External")
    pub external: bool,
}

impl Relationship {
    /// Check whether this relationship points at an embedded image part
    pub fn is_image(&self) -> bool {
        !self.external && self.rel_type.ends_with(IMAGE_REL)
    }
}

/// In-memory `.docx` package
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<Part>,
    main_document: String,
}

impl DocxPackage {
    /// Read a package from `.docx` bytes
    ///
    /// Fails if the bytes are not a ZIP container or if the main document
    /// part is missing.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            parts.push(Part {
                name: file.name().to_string(),
                data,
            });
        }

        let mut package = Self {
            parts,
            main_document: DEFAULT_MAIN_DOCUMENT.to_string(),
        };
        package.main_document = package.resolve_main_document()?;

        if package.part(&package.main_document).is_none() {
            return Err(DocxError::MissingPart(package.main_document));
        }

        Ok(package)
    }

    /// Serialize the package back into `.docx` bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Name of the main document part (usually `word/document.xml`)
    pub fn main_document_name(&self) -> &str {
        &self.main_document
    }

    /// Raw XML of the main document part
    pub fn main_document_xml(&self) -> Result<&[u8]> {
        self.part(&self.main_document)
            .ok_or_else(|| DocxError::MissingPart(self.main_document.clone()))
    }

    /// Replace the main document part
    pub fn set_main_document_xml(&mut self, xml: Vec<u8>) {
        let name = self.main_document.clone();
        self.set_part(&name, xml);
    }

    /// Get a part's bytes by name
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Replace a part, or append it if the package doesn't have it yet
    fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Relationships of the main document part, in declaration order
    pub fn document_relationships(&self) -> Result<Vec<Relationship>> {
        self.relationships_of(&self.main_document)
    }

    /// Relationships declared for `part_name`
    ///
    /// A part without a `.rels` companion simply has no relationships.
    fn relationships_of(&self, part_name: &str) -> Result<Vec<Relationship>> {
        let rels_name = rels_part_for(part_name);
        match self.part(&rels_name) {
            Some(xml) => parse_relationships(&rels_name, part_name, xml),
            None => Ok(Vec::new()),
        }
    }

    fn resolve_main_document(&self) -> Result<String> {
        let Some(xml) = self.part(PACKAGE_RELS) else {
            return Ok(DEFAULT_MAIN_DOCUMENT.to_string());
        };

        let main = parse_relationships(PACKAGE_RELS, "", xml)?
            .into_iter()
            .find(|rel| !rel.external && rel.rel_type.ends_with(OFFICE_DOCUMENT_REL))
            .map(|rel| rel.target)
            .unwrap_or_else(|| DEFAULT_MAIN_DOCUMENT.to_string());

        Ok(main)
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
fn rels_part_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part_name.is_empty() => PACKAGE_RELS.to_string(),
        None => format!("_rels/{}.rels", part_name),
    }
}

/// Resolve a relationship target against the directory of its source part
fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn parse_relationships(rels_name: &str, source_part: &str, xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut relationships = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (get_attr(&e, b"Id"), get_attr(&e, b"Target")) {
                    let external = get_attr(&e, b"TargetMode").as_deref() == Some("External");
                    relationships.push(Relationship {
                        id,
                        rel_type: get_attr(&e, b"Type").unwrap_or_default(),
                        target: if external {
                            target
                        } else {
                            resolve_target(source_part, &target)
                        },
                        external,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(DocxError::xml(rels_name, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DocxBuilder;

    #[test]
    fn test_rels_part_for() {
        assert_eq!(rels_part_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_part_for("document.xml"), "_rels/document.xml.rels");
        assert_eq!(rels_part_for(""), "_rels/.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word/document.xml", "media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("word/document.xml", "/word/media/a.jpeg"), "word/media/a.jpeg");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn test_round_trip_preserves_parts() {
        let bytes = DocxBuilder::new()
            .paragraph("<w:r><w:t>Hello</w:t></w:r>")
            .image("image1.png", b"\x89PNG fake")
            .build();

        let package = DocxPackage::from_bytes(&bytes).unwrap();
        assert_eq!(package.main_document_name(), "word/document.xml");

        let rewritten = DocxPackage::from_bytes(&package.to_bytes().unwrap()).unwrap();
        let before: Vec<&str> = package.parts.iter().map(|p| p.name.as_str()).collect();
        let after: Vec<&str> = rewritten.parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(before, after);
        assert_eq!(rewritten.part("word/media/image1.png"), Some(&b"\x89PNG fake"[..]));
    }

    #[test]
    fn test_document_relationships() {
        let bytes = DocxBuilder::new().image("image1.png", b"data").build();
        let package = DocxPackage::from_bytes(&bytes).unwrap();

        let rels = package.document_relationships().unwrap();
        let images: Vec<_> = rels.iter().filter(|r| r.is_image()).collect();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].target, "word/media/image1.png");
    }

    #[test]
    fn test_rejects_non_zip_bytes() {
        let err = DocxPackage::from_bytes(b"definitely not a docx").unwrap_err();
        assert!(matches!(err, DocxError::Zip(_)));
    }

    #[test]
    fn test_rejects_missing_main_document() {
        let bytes = DocxBuilder::new().without_document().build();
        let err = DocxPackage::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DocxError::MissingPart(name) if name == "word/document.xml"));
    }
}
