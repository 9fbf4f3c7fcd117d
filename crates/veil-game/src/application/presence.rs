//! Builds the initial snapshot when a client connects.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use veil_core::error::DomainError;
use veil_core::repository::Store;
use veil_core::viewer::Viewer;
use veil_stream::{ClientInfo, ConnectionListener, HubHandle, Message};

use crate::application::query_handlers::{admin_snapshot, player_snapshot};

/// Answers every newly registered client with `init-admin` or `init-player`.
///
/// A reconnecting client gets a fresh snapshot this way, which replaces
/// anything it missed while it was away. The hub holds back other messages
/// for the client until the snapshot is out, so a change racing the read
/// still reaches it afterwards.
pub struct SnapshotOnConnect {
    store: Arc<dyn Store>,
    hub: HubHandle,
}

impl SnapshotOnConnect {
    /// Creates the listener.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, hub: HubHandle) -> Self {
        Self { store, hub }
    }
}

#[async_trait]
impl ConnectionListener for SnapshotOnConnect {
    async fn client_added(&self, client: ClientInfo) -> Result<Message, DomainError> {
        let message = match client.viewer {
            Viewer::Admin => {
                let online = self.hub.clients().await.unwrap_or_default();
                Message::InitAdmin(admin_snapshot(self.store.as_ref(), &online).await?)
            }
            Viewer::Player(player_id) => {
                Message::InitPlayer(player_snapshot(self.store.as_ref(), player_id).await?)
            }
        };
        info!(viewer = %client.viewer, connection_id = %client.connection_id, "initial snapshot built");
        Ok(message)
    }

    async fn client_removed(&self, client: ClientInfo) -> Result<(), DomainError> {
        debug!(viewer = %client.viewer, connection_id = %client.connection_id, "client left");
        Ok(())
    }
}
