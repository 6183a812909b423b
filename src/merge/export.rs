//! Archive export
//!
//! Packs every document of a session into one ZIP. Exporting consumes the
//! session: once the archive is built the session is removed from the store.

use std::io::{Cursor, Write};

use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use super::error::{MergeError, Result};
use super::store::SessionStore;
use super::types::{
    document_file_name, DownloadedFile, GeneratedDocument, SessionId, ARCHIVE_FILE_NAME,
    DOWNLOAD_CONTENT_TYPE,
};

/// Build a ZIP with one `Merged_Letter_{n}.docx` entry per document
pub fn build_archive(documents: &[GeneratedDocument]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (index, document) in documents.iter().enumerate() {
        zip.start_file(document_file_name(index), options)
            .map_err(|e| MergeError::Archive(e.to_string()))?;
        zip.write_all(document.as_bytes())
            .map_err(|e| MergeError::Archive(e.to_string()))?;
    }

    let cursor = zip.finish().map_err(|e| MergeError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Export a session as an archive and remove it from the store
///
/// A missing or empty session is reported as not found and nothing is
/// removed; neither is anything removed when the archive can't be built.
pub fn export_session(store: &SessionStore, session_id: &SessionId) -> Result<DownloadedFile> {
    let documents = store.get(session_id)?;
    if documents.is_empty() {
        return Err(MergeError::SessionNotFound(session_id.to_string()));
    }

    let data = build_archive(&documents)?;
    store.remove(session_id);

    tracing::info!(
        session_id = %session_id,
        documents = documents.len(),
        size = data.len(),
        "Exported session archive"
    );

    Ok(DownloadedFile {
        file_name: ARCHIVE_FILE_NAME.to_string(),
        content_type: DOWNLOAD_CONTENT_TYPE,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn documents(count: usize) -> Vec<GeneratedDocument> {
        (0..count)
            .map(|i| GeneratedDocument::new(format!("doc-{}", i).into_bytes()))
            .collect()
    }

    fn entries(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(archive)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn test_archive_entries_are_numbered_in_order() {
        let archive = build_archive(&documents(2)).unwrap();

        assert_eq!(
            entries(&archive),
            vec![
                ("Merged_Letter_1.docx".to_string(), b"doc-0".to_vec()),
                ("Merged_Letter_2.docx".to_string(), b"doc-1".to_vec()),
            ]
        );
    }

    #[test]
    fn test_export_consumes_session() {
        let store = SessionStore::new();
        let id = SessionId::new();
        store.put(id, documents(2));

        let file = export_session(&store, &id).unwrap();
        assert_eq!(file.file_name, "merged_documents.zip");
        assert_eq!(entries(&file.data).len(), 2);

        assert!(matches!(store.get(&id), Err(MergeError::SessionNotFound(_))));
        assert!(matches!(export_session(&store, &id), Err(MergeError::SessionNotFound(_))));
    }

    #[test]
    fn test_export_of_empty_session_is_not_found_and_keeps_it() {
        let store = SessionStore::new();
        let id = SessionId::new();
        store.put(id, Vec::new());

        assert!(matches!(export_session(&store, &id), Err(MergeError::SessionNotFound(_))));
        assert_eq!(store.len(), 1);
    }
}
