//! HTML preview rendering
//!
//! Turns each merged document into an HTML fragment: one `<p>` per paragraph
//! carrying its alignment, runs wrapped in `<strong>`/`<em>`, and an `<img>`
//! link for every document-level picture. Every non-empty picture (inline or
//! document-level) is registered under a fresh image id so the client can
//! fetch it later.
//!
//! A document that can't be rendered gets an error fragment at its position;
//! the rest of the batch is still rendered.

use std::collections::HashMap;

use uuid::Uuid;

use crate::docx::{Alignment, DocxError, Paragraph, Picture, WordDocument};

use super::error::MergeError;
use super::types::{GeneratedDocument, SessionId, StoredImage};

/// Shown when a document has no usable pictures
const NO_IMAGES_NOTICE: &str =
    "<p class='image-error'>No images found in this document. Ensure images are embedded in the Word document.</p>";

/// Result of rendering every document of a session
#[derive(Debug, Default)]
pub struct Preview {
    /// One fragment per document, in document order
    pub fragments: Vec<String>,
    /// Images registered while rendering, keyed by image id
    pub images: HashMap<String, StoredImage>,
}

/// Render previews for all `documents` of a session
///
/// Image links take the form `{image_route}/{session_id}/{index}/{image_id}`.
pub fn render_previews(session_id: &SessionId, documents: &[GeneratedDocument], image_route: &str) -> Preview {
    let mut preview = Preview::default();

    for (index, document) in documents.iter().enumerate() {
        let mut images = HashMap::new();
        match render_document(session_id, index, document, image_route, &mut images) {
            Ok(fragment) => {
                preview.images.extend(images);
                preview.fragments.push(fragment);
            }
            Err(e) => {
                let reason = e.to_string();
                let err = MergeError::Render {
                    index: index + 1,
                    reason: reason.clone(),
                };
                tracing::error!(session_id = %session_id, error = %err, "Error processing document");
                preview.fragments.push(error_fragment(&reason));
            }
        }
    }

    tracing::info!(
        session_id = %session_id,
        previews = preview.fragments.len(),
        images = preview.images.len(),
        "Generated previews"
    );

    preview
}

fn render_document(
    session_id: &SessionId,
    index: usize,
    document: &GeneratedDocument,
    image_route: &str,
    images: &mut HashMap<String, StoredImage>,
) -> Result<String, DocxError> {
    let doc = WordDocument::from_bytes(document.as_bytes())?;

    let mut html = String::from("<div class='document-preview'>");
    let mut has_images = false;

    for paragraph in &doc.paragraphs {
        html.push_str(&render_paragraph(paragraph));

        for picture in paragraph.runs.iter().flat_map(|run| &run.pictures) {
            if register_image(picture, index, images).is_some() {
                has_images = true;
            } else {
                tracing::warn!(
                    document = index + 1,
                    part = %picture.part_name,
                    "Invalid or empty picture data in run"
                );
            }
        }
    }

    tracing::debug!(
        document = index + 1,
        pictures = doc.pictures.len(),
        "Found document-level images"
    );
    for picture in &doc.pictures {
        match register_image(picture, index, images) {
            Some(image_id) => {
                html.push_str(&format!(
                    "<p><img src='{}/{}/{}/{}' alt='Document Image' style='max-width: 100%; height: auto;'/></p>",
                    image_route.trim_end_matches('/'),
                    session_id,
                    index,
                    image_id
                ));
                has_images = true;
            }
            None => tracing::warn!(
                document = index + 1,
                part = %picture.part_name,
                "Invalid or empty picture data at document level"
            ),
        }
    }

    if !has_images {
        tracing::warn!(session_id = %session_id, document = index + 1, "No valid images found in document");
        html.push_str(NO_IMAGES_NOTICE);
    }

    html.push_str("</div>");
    Ok(html)
}

fn render_paragraph(paragraph: &Paragraph) -> String {
    let align = match paragraph.alignment {
        Some(Alignment::Center) => "center",
        Some(Alignment::Right) => "right",
        _ => "left",
    };

    let mut html = format!("<p style='text-align: {};'>", align);
    for run in &paragraph.runs {
        let Some(text) = &run.text else {
            continue;
        };

        let mut content = html_escape::encode_text(text).into_owned();
        if run.italic {
            content = format!("<em>{}</em>", content);
        }
        if run.bold {
            content = format!("<strong>{}</strong>", content);
        }
        html.push_str(&content);
    }
    html.push_str("</p>");

    html
}

/// Store a picture under a fresh id; empty pictures are skipped
fn register_image(picture: &Picture, document_index: usize, images: &mut HashMap<String, StoredImage>) -> Option<String> {
    if picture.data.is_empty() {
        return None;
    }

    let image_id = Uuid::new_v4().to_string();
    let content_type = mime_guess::from_path(&picture.part_name)
        .first_or_octet_stream()
        .to_string();

    tracing::debug!(
        document = document_index + 1,
        image_id = %image_id,
        size = picture.data.len(),
        "Registered preview image"
    );

    images.insert(
        image_id.clone(),
        StoredImage {
            document_index,
            content_type,
            data: picture.data.clone(),
        },
    );

    Some(image_id)
}

fn error_fragment(message: &str) -> String {
    format!(
        "<div class='document-preview'><p class='error'>Error generating preview: {}</p></div>",
        html_escape::encode_text(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{picture_run, run, styled_run, DocxBuilder};

    fn document(builder: DocxBuilder) -> GeneratedDocument {
        GeneratedDocument::new(builder.build())
    }

    fn render_one(builder: DocxBuilder) -> Preview {
        render_previews(&SessionId::new(), &[document(builder)], "/mail-merge/image")
    }

    #[test]
    fn test_paragraph_alignment_styles() {
        let preview = render_one(
            DocxBuilder::new()
                .paragraph(&format!(r#"<w:pPr><w:jc w:val="center"/></w:pPr>{}"#, run("a")))
                .paragraph(&format!(r#"<w:pPr><w:jc w:val="right"/></w:pPr>{}"#, run("b")))
                .paragraph(&format!(r#"<w:pPr><w:jc w:val="both"/></w:pPr>{}"#, run("c")))
                .paragraph(&run("d")),
        );

        let html = &preview.fragments[0];
        assert!(html.starts_with("<div class='document-preview'>"));
        assert!(html.contains("<p style='text-align: center;'>a</p>"));
        assert!(html.contains("<p style='text-align: right;'>b</p>"));
        assert!(html.contains("<p style='text-align: left;'>c</p>"));
        assert!(html.contains("<p style='text-align: left;'>d</p>"));
    }

    #[test]
    fn test_bold_wraps_italic() {
        let preview = render_one(DocxBuilder::new().paragraph(&format!(
            "{}{}{}",
            styled_run("both", true, true),
            styled_run("bold", true, false),
            styled_run("italic", false, true)
        )));

        assert!(preview.fragments[0].contains(
            "<p style='text-align: left;'><strong><em>both</em></strong><strong>bold</strong><em>italic</em></p>"
        ));
    }

    #[test]
    fn test_text_is_escaped() {
        let preview = render_one(DocxBuilder::new().paragraph(&run("<b>Fish & Chips</b>")));
        assert!(preview.fragments[0].contains("&lt;b&gt;Fish &amp; Chips&lt;/b&gt;"));
    }

    #[test]
    fn test_document_without_images_gets_notice() {
        let preview = render_one(DocxBuilder::new().paragraph(&run("Hi")));
        assert!(preview.fragments[0].ends_with(&format!("{}</div>", NO_IMAGES_NOTICE)));
        assert!(preview.images.is_empty());
    }

    #[test]
    fn test_inline_images_are_registered_without_markup() {
        let session_id = SessionId::new();
        let bytes = DocxBuilder::new()
            .paragraph(&picture_run("rIdImage1"))
            .image("image1.png", b"png-bytes")
            .build();

        let preview = render_previews(&session_id, &[GeneratedDocument::new(bytes)], "/mail-merge/image");

        // Once as inline picture, once as document-level picture
        assert_eq!(preview.images.len(), 2);
        assert!(preview.images.values().all(|img| img.data == b"png-bytes"));
        assert!(preview.images.values().all(|img| img.content_type == "image/png"));

        let html = &preview.fragments[0];
        assert_eq!(html.matches("<img ").count(), 1);
        assert!(!html.contains("image-error"));
    }

    #[test]
    fn test_document_level_image_links() {
        let session_id = SessionId::new();
        let docs = vec![
            document(DocxBuilder::new().paragraph(&run("first"))),
            document(DocxBuilder::new().paragraph(&run("second")).image("photo.jpeg", b"jpeg")),
        ];

        let preview = render_previews(&session_id, &docs, "/mail-merge/image/");

        assert_eq!(preview.images.len(), 1);
        let (image_id, image) = preview.images.iter().next().unwrap();
        assert_eq!(image.document_index, 1);
        assert_eq!(image.content_type, "image/jpeg");

        let expected = format!(
            "<p><img src='/mail-merge/image/{}/1/{}' alt='Document Image' style='max-width: 100%; height: auto;'/></p>",
            session_id, image_id
        );
        assert!(preview.fragments[1].contains(&expected));
        assert!(preview.fragments[0].contains("image-error"));
    }

    #[test]
    fn test_empty_pictures_are_skipped() {
        let preview = render_one(
            DocxBuilder::new()
                .paragraph(&picture_run("rIdImage1"))
                .image("empty.png", b""),
        );

        assert!(preview.images.is_empty());
        assert!(preview.fragments[0].contains("image-error"));
    }

    #[test]
    fn test_broken_document_yields_error_fragment_in_place() {
        let docs = vec![
            document(DocxBuilder::new().paragraph(&run("one"))),
            GeneratedDocument::new(b"<broken>".to_vec()),
            document(DocxBuilder::new().paragraph(&run("three"))),
        ];

        let preview = render_previews(&SessionId::new(), &docs, "/mail-merge/image");

        assert_eq!(preview.fragments.len(), 3);
        assert!(preview.fragments[0].contains("one"));
        assert!(preview.fragments[1]
            .starts_with("<div class='document-preview'><p class='error'>Error generating preview: "));
        assert!(preview.fragments[2].contains("three"));
    }
}
