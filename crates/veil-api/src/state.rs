//! Shared application state.

use std::sync::Arc;

use veil_core::repository::Store;
use veil_stream::HubHandle;

use crate::session::SessionSigner;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Players, characters and actions.
    pub store: Arc<dyn Store>,
    /// Handle to the running event hub.
    pub hub: HubHandle,
    /// Signs and verifies session cookies.
    pub sessions: SessionSigner,
    /// Login name that grants the administrator role.
    pub admin_key: Arc<str>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        hub: HubHandle,
        sessions: SessionSigner,
        admin_key: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            hub,
            sessions,
            admin_key: admin_key.into(),
        }
    }
}
