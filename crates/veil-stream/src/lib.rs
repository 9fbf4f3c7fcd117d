//! Veil Stream — the message catalog and the real-time event hub.
//!
//! The hub is a single task owning the registry of connected clients. Every
//! other component talks to it through a [`HubHandle`]: `connect`,
//! `disconnect`, and `send`.

pub mod client;
pub mod error;
pub mod handle;
pub mod hub;
pub mod listener;
pub mod messages;

pub use client::{ClientInfo, Subscription};
pub use error::HubError;
pub use handle::{Broadcaster, HubHandle};
pub use hub::EventHub;
pub use listener::ConnectionListener;
pub use messages::Message;
