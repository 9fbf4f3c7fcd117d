//! Veil API — HTTP routes, session cookies and the live event stream.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// The full application router, without transport layers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::auth::router().merge(routes::stream::router()))
        .nest("/api/v1/players", routes::players::router())
        .nest("/api/v1/characters", routes::characters::router())
        .nest("/api/v1/actions", routes::actions::router())
        .with_state(state)
}
