//! Mail merge boundary operations
//!
//! `MergeService` is what the HTTP layer talks to. Session ids arrive as
//! strings and are validated here; all operations are synchronous and meant
//! to run on a blocking thread.

use super::error::{MergeError, Result};
use super::export::export_session;
use super::orchestrator;
use super::preview::render_previews;
use super::store::SessionStore;
use super::types::{document_file_name, DownloadedFile, SessionId, StoredImage, DOWNLOAD_CONTENT_TYPE};

/// Merge, preview and download operations over one session store
#[derive(Clone)]
pub struct MergeService {
    store: SessionStore,
    /// URL prefix of preview image links
    image_route: String,
}

impl MergeService {
    pub fn new(store: SessionStore, image_route: impl Into<String>) -> Self {
        Self {
            store,
            image_route: image_route.into(),
        }
    }

    /// The underlying session store
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Merge a template with every spreadsheet row into a new session
    pub fn merge(&self, template: &[u8], table: &[u8]) -> Result<SessionId> {
        let session_id = orchestrator::merge(&self.store, template, table)?;
        tracing::info!(session_id = %session_id, "Completed mail merge");
        Ok(session_id)
    }

    /// Render one HTML fragment per document of a session
    ///
    /// Replaces the session's preview images with the ones found now.
    pub fn preview(&self, session_id: &str) -> Result<Vec<String>> {
        let id = SessionId::parse(session_id)?;
        let documents = self.store.get(&id)?;
        if documents.is_empty() {
            return Err(MergeError::SessionNotFound(session_id.to_string()));
        }

        let preview = render_previews(&id, &documents, &self.image_route);
        if !self.store.put_images(&id, preview.images) {
            tracing::warn!(session_id = %id, "Session removed while rendering preview");
        }

        Ok(preview.fragments)
    }

    /// Get the document at `index` (0-based)
    pub fn download_one(&self, session_id: &str, index: i64) -> Result<DownloadedFile> {
        let id = SessionId::parse(session_id)?;
        let document = self.store.document(&id, index)?;

        Ok(DownloadedFile {
            // document() only succeeds for indices in 0..count
            file_name: document_file_name(index as usize),
            content_type: DOWNLOAD_CONTENT_TYPE,
            data: document.as_bytes().to_vec(),
        })
    }

    /// Archive every document of a session; the session is consumed
    pub fn download_all(&self, session_id: &str) -> Result<DownloadedFile> {
        let id = SessionId::parse(session_id)?;
        export_session(&self.store, &id)
    }

    /// Get an image registered by the latest preview of a session
    pub fn fetch_image(&self, session_id: &str, document_index: usize, image_id: &str) -> Result<StoredImage> {
        let id = SessionId::parse(session_id)?;
        self.store.image(&id, document_index, image_id)
    }
}
