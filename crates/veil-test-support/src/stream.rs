//! Helpers for reading a live `Subscription` in tests.

use std::time::Duration;

use tokio::time::timeout;
use veil_stream::{Message, Subscription};

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(100);

/// Waits for the next message on a subscription.
///
/// # Panics
///
/// Panics if nothing arrives within two seconds, or if the stream ended.
pub async fn next_message(subscription: &mut Subscription) -> Message {
    timeout(WAIT, subscription.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("stream ended while waiting for a message")
}

/// Asserts that nothing arrives on a subscription for a short while.
///
/// # Panics
///
/// Panics if a message arrives.
pub async fn assert_no_message(subscription: &mut Subscription) {
    if let Ok(Some(message)) = timeout(QUIET, subscription.recv()).await {
        panic!("expected no message, got {message:?}");
    }
}
