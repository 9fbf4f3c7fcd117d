//! Cloneable entry points into the hub loop.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;
use veil_core::viewer::Viewer;

use crate::client::{CLIENT_BUFFER, ClientInfo, ConnectedClient, Subscription};
use crate::error::HubError;
use crate::hub::HubCommand;
use crate::messages::Message;

/// Sends messages to viewers.
///
/// The seam between the operations that produce messages and the hub that
/// delivers them. Delivery is best-effort: implementations never report a
/// miss back to the caller.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Submit a message for one recipient.
    async fn send(&self, recipient: Viewer, message: Message);
}

/// Handle to a running `EventHub`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HubHandle {
    pub(crate) commands: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Opens a connection for `viewer`. A previous connection for the same
    /// viewer is replaced and its stream ends.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub has stopped.
    pub async fn connect(
        &self,
        viewer: Viewer,
        name: impl Into<String>,
    ) -> Result<Subscription, HubError> {
        let (sender, receiver) = mpsc::channel(CLIENT_BUFFER);
        let info = ClientInfo {
            connection_id: Uuid::new_v4(),
            viewer,
            name: name.into(),
            connected_at: Utc::now(),
        };
        let connection_id = info.connection_id;

        self.commands
            .send(HubCommand::Connect(ConnectedClient {
                info,
                sender,
                held: None,
            }))
            .await
            .map_err(|_| HubError::Closed)?;

        Ok(Subscription::new(
            connection_id,
            viewer,
            receiver,
            self.clone(),
        ))
    }

    /// Closes a connection. Ignored if `connection_id` is no longer the
    /// viewer's current connection.
    pub async fn disconnect(&self, viewer: Viewer, connection_id: Uuid) {
        let command = HubCommand::Disconnect {
            viewer,
            connection_id,
        };
        if self.commands.send(command).await.is_err() {
            debug!(%viewer, %connection_id, "event hub stopped; disconnect ignored");
        }
    }

    /// Submits a message for `recipient`. Waits for inbox capacity, so
    /// messages from one caller are delivered in submission order.
    pub async fn send(&self, recipient: Viewer, message: Message) {
        let kind = message.kind();
        let command = HubCommand::Send { recipient, message };
        if self.commands.send(command).await.is_err() {
            warn!(%recipient, kind, "event hub stopped; message dropped");
        }
    }

    /// Lists the currently connected clients.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub has stopped.
    pub async fn clients(&self) -> Result<Vec<ClientInfo>, HubError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(HubCommand::Clients { reply })
            .await
            .map_err(|_| HubError::Closed)?;
        response.await.map_err(|_| HubError::Closed)
    }
}

#[async_trait]
impl Broadcaster for HubHandle {
    async fn send(&self, recipient: Viewer, message: Message) {
        HubHandle::send(self, recipient, message).await;
    }
}
