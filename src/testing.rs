//! Test fixtures: minimal `.docx` packages and spreadsheets built in memory

use std::io::{Cursor, Write};

use rust_xlsxwriter::Workbook;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const IMAGE_REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Builds a minimal but well-formed `.docx` package
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    images: Vec<(String, Vec<u8>)>,
    without_document: bool,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `<w:p>{inner}</w:p>` to the body
    pub fn paragraph(mut self, inner: &str) -> Self {
        self.body.push_str("<w:p>");
        self.body.push_str(inner);
        self.body.push_str("</w:p>");
        self
    }

    /// Append raw body XML
    pub fn raw(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    /// Add `word/media/{name}` with relationship id `rIdImage{n}` (1-based)
    pub fn image(mut self, name: &str, data: &[u8]) -> Self {
        self.images.push((name.to_string(), data.to_vec()));
        self
    }

    /// Leave out `word/document.xml`
    pub fn without_document(mut self) -> Self {
        self.without_document = true;
        self
    }

    pub fn document_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                "<w:body>{}<w:sectPr/></w:body></w:document>"
            ),
            self.body
        )
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();

        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(PACKAGE_RELS.as_bytes()).unwrap();

        if !self.without_document {
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(self.document_xml().as_bytes()).unwrap();
        }

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (i, (name, _)) in self.images.iter().enumerate() {
            rels.push_str(&format!(
                r#"<Relationship Id="rIdImage{}" Type="{}" Target="media/{}"/>"#,
                i + 1,
                IMAGE_REL_TYPE,
                name
            ));
        }
        rels.push_str("</Relationships>");
        zip.start_file("word/_rels/document.xml.rels", options).unwrap();
        zip.write_all(rels.as_bytes()).unwrap();

        for (name, data) in &self.images {
            zip.start_file(format!("word/media/{}", name), options).unwrap();
            zip.write_all(data).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }
}

/// A plain run: `<w:r><w:t xml:space="preserve">text</w:t></w:r>`
pub fn run(text: &str) -> String {
    format!(
        r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
        html_escape::encode_text(text)
    )
}

/// A run with bold and/or italic run properties
pub fn styled_run(text: &str, bold: bool, italic: bool) -> String {
    let mut props = String::new();
    if bold {
        props.push_str("<w:b/>");
    }
    if italic {
        props.push_str("<w:i/>");
    }
    format!(
        r#"<w:r><w:rPr>{}</w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        props,
        html_escape::encode_text(text)
    )
}

/// A run holding an inline drawing that embeds relationship `rel_id`
pub fn picture_run(rel_id: &str) -> String {
    format!(
        concat!(
            "<w:r><w:drawing><wp:inline><wp:extent cx=\"100\" cy=\"100\"/>",
            "<a:graphic><a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:pic><pic:blipFill><a:blip r:embed=\"{}\"/></pic:blipFill></pic:pic>",
            "</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"
        ),
        rel_id
    )
}

/// Build an `.xlsx` workbook whose first sheet holds `rows` as strings
pub fn spreadsheet(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}
