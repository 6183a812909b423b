//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::merge::{MergeService, SessionStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    merge_service: MergeService,
}

impl AppState {
    /// Create a new application state around an existing session store
    pub fn new(config: Config, store: SessionStore) -> Self {
        let merge_service = MergeService::new(store, config.preview.image_route.clone());

        Self {
            inner: Arc::new(AppStateInner { config, merge_service }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the merge service
    pub fn merge_service(&self) -> &MergeService {
        &self.inner.merge_service
    }

    /// Get the session store
    pub fn session_store(&self) -> &SessionStore {
        self.inner.merge_service.store()
    }
}
