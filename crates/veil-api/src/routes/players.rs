//! Administrator routes for players.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;
use veil_core::ids::PlayerId;
use veil_game::application::{command_handlers, query_handlers};
use veil_game::domain::commands;
use veil_stream::messages::PlayerStatus;

use crate::error::ApiError;
use crate::session::AdminSession;
use crate::state::AppState;

/// GET /
async fn list_players(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<Vec<PlayerStatus>>, ApiError> {
    let online = state.hub.clients().await?;
    let players = query_handlers::list_players_with_status(state.store.as_ref(), &online).await?;
    Ok(Json(players))
}

/// DELETE /{id}
#[instrument(skip(state, _admin))]
async fn delete_player(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(player_id): Path<PlayerId>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeletePlayer {
        correlation_id: Uuid::new_v4(),
        player_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_player command");

    command_handlers::handle_delete_player(&command, state.store.as_ref(), &state.hub).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for players.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_players))
        .route("/{id}", delete(delete_player))
}
