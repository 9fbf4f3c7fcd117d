//! A `Broadcaster` that remembers instead of delivering.

use std::sync::Mutex;

use async_trait::async_trait;
use veil_core::viewer::Viewer;
use veil_stream::{Broadcaster, Message};

/// Records every submitted message, in submission order.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    sent: Mutex<Vec<(Viewer, Message)>>,
}

impl RecordingBroadcaster {
    /// Creates a broadcaster with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<(Viewer, Message)> {
        self.sent.lock().unwrap().clone()
    }

    /// Returns the messages sent to one recipient.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent_to(&self, recipient: Viewer) -> Vec<Message> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == recipient)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn send(&self, recipient: Viewer, message: Message) {
        self.sent.lock().unwrap().push((recipient, message));
    }
}
