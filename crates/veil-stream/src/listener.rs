//! Callbacks the hub runs when clients come and go.

use async_trait::async_trait;
use veil_core::error::DomainError;

use crate::client::ClientInfo;
use crate::messages::Message;

/// Reacts to registry changes.
///
/// Callbacks run on their own tasks after the hub has updated its registry.
/// Errors and panics are logged by the hub and never reach its loop.
/// Installing a listener makes every new client wait for its initial
/// snapshot before anything else is delivered to it.
#[async_trait]
pub trait ConnectionListener: Send + Sync {
    /// A client was registered. Returns the first message it receives.
    /// Messages addressed to the client meanwhile are delivered after it.
    ///
    /// # Errors
    ///
    /// Any error is logged and the connection is closed.
    async fn client_added(&self, client: ClientInfo) -> Result<Message, DomainError>;

    /// A client was deregistered.
    ///
    /// # Errors
    ///
    /// Any error is logged by the hub.
    async fn client_removed(&self, client: ClientInfo) -> Result<(), DomainError> {
        let _ = client;
        Ok(())
    }
}
