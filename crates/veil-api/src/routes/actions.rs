//! Administrator routes for actions: CRUD, reveal and hide.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use veil_core::ids::{ActionId, CharacterId};
use veil_core::model::Action;
use veil_game::application::command_handlers;
use veil_game::domain::commands;

use crate::error::ApiError;
use crate::session::AdminSession;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActionRequest {
    /// The character the action belongs to.
    pub character_id: CharacterId,
    /// The secret itself.
    pub content: String,
}

/// Request body for PUT /{id}.
#[derive(Debug, Deserialize)]
pub struct UpdateActionRequest {
    /// The new content.
    pub content: String,
}

/// POST /
#[instrument(skip(state, _admin, request), fields(character_id = %request.character_id))]
async fn create_action(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(request): Json<CreateActionRequest>,
) -> Result<(StatusCode, Json<Action>), ApiError> {
    let command = commands::CreateAction {
        correlation_id: Uuid::new_v4(),
        character_id: request.character_id,
        content: request.content,
    };

    info!(correlation_id = %command.correlation_id, "handling create_action command");

    let action =
        command_handlers::handle_create_action(&command, state.store.as_ref(), &state.hub).await?;
    Ok((StatusCode::CREATED, Json(action)))
}

/// PUT /{id}
#[instrument(skip(state, _admin, request))]
async fn update_action(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(action_id): Path<ActionId>,
    Json(request): Json<UpdateActionRequest>,
) -> Result<Json<Action>, ApiError> {
    let command = commands::UpdateAction {
        correlation_id: Uuid::new_v4(),
        action_id,
        content: request.content,
    };

    info!(correlation_id = %command.correlation_id, "handling update_action command");

    let action =
        command_handlers::handle_update_action(&command, state.store.as_ref(), &state.hub).await?;
    Ok(Json(action))
}

/// DELETE /{id}
#[instrument(skip(state, _admin))]
async fn delete_action(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(action_id): Path<ActionId>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteAction {
        correlation_id: Uuid::new_v4(),
        action_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_action command");

    command_handlers::handle_delete_action(&command, state.store.as_ref(), &state.hub).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /{id}/reveal
#[instrument(skip(state, _admin))]
async fn reveal_action(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(action_id): Path<ActionId>,
) -> Result<Json<Action>, ApiError> {
    let command = commands::RevealAction {
        correlation_id: Uuid::new_v4(),
        action_id,
    };

    info!(correlation_id = %command.correlation_id, "handling reveal_action command");

    let action =
        command_handlers::handle_reveal_action(&command, state.store.as_ref(), &state.hub).await?;
    Ok(Json(action))
}

/// POST /{id}/hide
#[instrument(skip(state, _admin))]
async fn hide_action(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(action_id): Path<ActionId>,
) -> Result<Json<Action>, ApiError> {
    let command = commands::HideAction {
        correlation_id: Uuid::new_v4(),
        action_id,
    };

    info!(correlation_id = %command.correlation_id, "handling hide_action command");

    let action =
        command_handlers::handle_hide_action(&command, state.store.as_ref(), &state.hub).await?;
    Ok(Json(action))
}

/// Returns the router for actions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_action))
        .route("/{id}", put(update_action).delete(delete_action))
        .route("/{id}/reveal", post(reveal_action))
        .route("/{id}/hide", post(hide_action))
}
