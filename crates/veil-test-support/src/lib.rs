//! Shared test doubles and stream helpers for Veil.

mod broadcaster;
mod store;
mod stream;

pub use broadcaster::RecordingBroadcaster;
pub use store::{FailingStore, InMemoryStore, PausedRead};
pub use stream::{assert_no_message, next_message};
