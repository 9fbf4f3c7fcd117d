//! Event hub error types.

use thiserror::Error;

/// Errors returned by request/reply calls on a `HubHandle`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The hub loop has stopped and no longer accepts requests.
    #[error("event hub is not running")]
    Closed,
}
