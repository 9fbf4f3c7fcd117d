//! Connected clients and their delivery channels.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;
use veil_core::viewer::Viewer;

use crate::handle::HubHandle;
use crate::hub::HubCommand;
use crate::messages::Message;

/// Capacity of a client's delivery channel. A client that falls this far
/// behind is evicted and resynchronizes on reconnect.
pub const CLIENT_BUFFER: usize = 64;

/// Public description of a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Unique per stream; distinguishes a reconnect from the connection it replaced.
    pub connection_id: Uuid,
    /// Who is connected.
    pub viewer: Viewer,
    /// Display name at connect time.
    pub name: String,
    /// When the stream was opened.
    pub connected_at: DateTime<Utc>,
}

/// A registry entry. Owned exclusively by the hub loop.
#[derive(Debug)]
pub(crate) struct ConnectedClient {
    pub(crate) info: ClientInfo,
    pub(crate) sender: mpsc::Sender<Message>,
    /// Messages waiting for the initial snapshot. `None` once synced.
    pub(crate) held: Option<VecDeque<Message>>,
}

/// The receiving end of a live connection.
///
/// Dropping a subscription tells the hub the connection closed.
#[derive(Debug)]
pub struct Subscription {
    connection_id: Uuid,
    viewer: Viewer,
    receiver: mpsc::Receiver<Message>,
    hub: HubHandle,
}

impl Subscription {
    pub(crate) fn new(
        connection_id: Uuid,
        viewer: Viewer,
        receiver: mpsc::Receiver<Message>,
        hub: HubHandle,
    ) -> Self {
        Self {
            connection_id,
            viewer,
            receiver,
            hub,
        }
    }

    /// The id the hub registered this connection under.
    #[must_use]
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Waits for the next message. Returns `None` once the hub has dropped
    /// this connection (replaced, evicted, or hub stopped) and the buffer is
    /// drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let command = HubCommand::Disconnect {
            viewer: self.viewer,
            connection_id: self.connection_id,
        };
        match self.hub.commands.try_send(command) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(command)) => {
                // Inbox is busy; finish the disconnect in the background.
                if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                    let commands = self.hub.commands.clone();
                    runtime.spawn(async move {
                        let _ = commands.send(command).await;
                    });
                } else {
                    tracing::warn!(
                        viewer = %self.viewer,
                        connection_id = %self.connection_id,
                        "no runtime to submit disconnect; hub will notice on next delivery"
                    );
                }
            }
        }
    }
}
