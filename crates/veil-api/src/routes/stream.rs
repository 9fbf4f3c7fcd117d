//! The live event stream, delivered as server-sent events.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures_util::stream::{self, Stream};
use tracing::{info, instrument};
use veil_stream::Message;

use crate::error::ApiError;
use crate::session::Session;
use crate::state::AppState;

fn to_event(message: &Message) -> Result<Event, axum::Error> {
    Event::default().event(message.kind()).json_data(message)
}

/// GET /stream
///
/// Registers the caller with the event hub. The first event is the caller's
/// initial snapshot; the connection is deregistered when the client goes
/// away.
#[instrument(skip_all, fields(viewer = %session.viewer))]
async fn open_stream(
    State(state): State<AppState>,
    session: Session,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let subscription = state.hub.connect(session.viewer, session.name).await?;
    info!(connection_id = %subscription.connection_id(), "stream opened");

    let events = stream::unfold(subscription, |mut subscription| async move {
        let message = subscription.recv().await?;
        Some((to_event(&message), subscription))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Returns the router for the event stream.
pub fn router() -> Router<AppState> {
    Router::new().route("/stream", get(open_stream))
}
