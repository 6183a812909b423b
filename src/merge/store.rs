//! Session Result Store
//!
//! Process-wide state keyed by session id:
//! - The merged documents of one merge request, in row order
//! - The images registered by the latest preview of that session
//!
//! Every operation reads or replaces a whole entry under one lock. Document
//! lists are handed out as `Arc<[_]>`, so previews and exports never hold the
//! lock while they work.
//!
//! Sessions can carry a time-to-live. Expired sessions are invisible to
//! lookups and removed by `purge_expired` / the background cleanup task.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use super::error::{MergeError, Result};
use super::types::{GeneratedDocument, SessionId, StoredImage};

// ============================================================================
// Session Entry
// ============================================================================

struct SessionEntry {
    documents: Arc<[GeneratedDocument]>,
    /// Images from the latest preview, keyed by image id
    images: HashMap<String, StoredImage>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

// ============================================================================
// Session Store
// ============================================================================

/// Shared handle to the session store
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,

    /// Session lifetime (None = keep until exported)
    ttl: Option<Duration>,
}

impl SessionStore {
    /// Create a store whose sessions never expire
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    /// Create a store whose sessions expire `ttl` after creation
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                ttl,
            }),
        }
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Store the documents of a new session
    pub fn put(&self, session_id: SessionId, documents: Vec<GeneratedDocument>) {
        let now = Utc::now();
        let count = documents.len();
        let entry = SessionEntry {
            documents: documents.into(),
            images: HashMap::new(),
            created_at: now,
            // A lifetime past the representable range never expires
            expires_at: self.inner.ttl.and_then(|ttl| now.checked_add_signed(ttl)),
        };

        self.inner.sessions.write().insert(session_id, entry);

        tracing::info!(session_id = %session_id, documents = count, "Stored merge session");
    }

    /// Get all documents of a session
    pub fn get(&self, session_id: &SessionId) -> Result<Arc<[GeneratedDocument]>> {
        let sessions = self.inner.sessions.read();
        sessions
            .get(session_id)
            .filter(|entry| !entry.is_expired(Utc::now()))
            .map(|entry| Arc::clone(&entry.documents))
            .ok_or_else(|| MergeError::SessionNotFound(session_id.to_string()))
    }

    /// Get one document by position
    ///
    /// Negative or too-large positions are reported as `IndexOutOfRange`.
    pub fn document(&self, session_id: &SessionId, index: i64) -> Result<GeneratedDocument> {
        let documents = self.get(session_id)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| documents.get(i))
            .cloned()
            .ok_or_else(|| MergeError::IndexOutOfRange {
                session_id: session_id.to_string(),
                index,
                count: documents.len(),
            })
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Replace the image map of a session
    ///
    /// Returns false (and drops the images) when the session no longer
    /// exists, so a consumed session is never brought back.
    pub fn put_images(&self, session_id: &SessionId, images: HashMap<String, StoredImage>) -> bool {
        let mut sessions = self.inner.sessions.write();
        match sessions.get_mut(session_id) {
            Some(entry) => {
                entry.images = images;
                true
            }
            None => false,
        }
    }

    /// Get one preview image registered for the document at `document_index`
    pub fn image(&self, session_id: &SessionId, document_index: usize, image_id: &str) -> Result<StoredImage> {
        let sessions = self.inner.sessions.read();
        let entry = sessions
            .get(session_id)
            .filter(|entry| !entry.is_expired(Utc::now()))
            .ok_or_else(|| MergeError::SessionNotFound(session_id.to_string()))?;

        entry
            .images
            .get(image_id)
            .filter(|image| image.document_index == document_index)
            .cloned()
            .ok_or_else(|| MergeError::ImageNotFound {
                session_id: session_id.to_string(),
                document_index,
                image_id: image_id.to_string(),
            })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Remove a session's documents and images
    ///
    /// Idempotent; returns whether a session was removed.
    pub fn remove(&self, session_id: &SessionId) -> bool {
        let removed = self.inner.sessions.write().remove(session_id);
        if let Some(entry) = &removed {
            tracing::info!(
                session_id = %session_id,
                age_secs = (Utc::now() - entry.created_at).num_seconds(),
                "Cleaned up storage for session"
            );
        }
        removed.is_some()
    }

    /// Number of stored sessions, expired ones included until purged
    pub fn len(&self) -> usize {
        self.inner.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired session
    ///
    /// Returns the number of sessions removed
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.inner.sessions.write();

        let before = sessions.len();
        sessions.retain(|session_id, entry| {
            let expired = entry.is_expired(now);
            if expired {
                tracing::debug!(session_id = %session_id, "Expired merge session");
            }
            !expired
        });
        let count = before - sessions.len();

        if count > 0 {
            tracing::info!(count = count, "Cleaned up expired merge sessions");
        }

        count
    }

    /// Start background cleanup task
    pub fn start_cleanup_task(self, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);

            loop {
                interval.tick().await;
                self.purge_expired();
            }
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
