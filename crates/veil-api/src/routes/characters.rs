//! Administrator routes for characters: CRUD, reveal flags and assignment.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use veil_core::ids::{CharacterId, PlayerId};
use veil_core::model::{CharacterProfile, CharacterWithActions, RevealedFields};
use veil_game::application::{command_handlers, query_handlers};
use veil_game::domain::commands;
use veil_stream::messages::CharacterWithFields;

use crate::error::ApiError;
use crate::session::AdminSession;
use crate::state::AppState;

/// Request body for PUT /{id}/reveal. Omitted flags are hidden.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RevealRequest {
    /// Reveal `name`.
    pub name: bool,
    /// Reveal `race`.
    pub race: bool,
    /// Reveal `gender`.
    pub gender: bool,
    /// Reveal `age`.
    pub age: bool,
    /// Reveal `description`.
    pub description: bool,
    /// Reveal `appearance`.
    pub appearance: bool,
}

impl RevealRequest {
    fn for_character(self, character_id: CharacterId) -> RevealedFields {
        RevealedFields {
            character_id,
            name: self.name,
            race: self.race,
            gender: self.gender,
            age: self.age,
            description: self.description,
            appearance: self.appearance,
        }
    }
}

/// Request body for POST /{id}/assign.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    /// The new owner.
    pub player_id: PlayerId,
}

/// GET /
async fn list_characters(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<Vec<CharacterWithFields>>, ApiError> {
    Ok(Json(query_handlers::list_characters(state.store.as_ref()).await?))
}

/// POST /
#[instrument(skip_all)]
async fn create_character(
    State(state): State<AppState>,
    _admin: AdminSession,
    Json(profile): Json<CharacterProfile>,
) -> Result<(StatusCode, Json<CharacterWithFields>), ApiError> {
    let command = commands::CreateCharacter {
        correlation_id: Uuid::new_v4(),
        profile,
    };

    info!(correlation_id = %command.correlation_id, "handling create_character command");

    let created =
        command_handlers::handle_create_character(&command, state.store.as_ref(), &state.hub)
            .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /{id}
#[instrument(skip(state, _admin, profile))]
async fn update_character(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(character_id): Path<CharacterId>,
    Json(profile): Json<CharacterProfile>,
) -> Result<Json<CharacterWithActions>, ApiError> {
    let command = commands::UpdateCharacter {
        correlation_id: Uuid::new_v4(),
        character_id,
        profile,
    };

    info!(correlation_id = %command.correlation_id, "handling update_character command");

    let updated =
        command_handlers::handle_update_character(&command, state.store.as_ref(), &state.hub)
            .await?;
    Ok(Json(updated))
}

/// DELETE /{id}
#[instrument(skip(state, _admin))]
async fn delete_character(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(character_id): Path<CharacterId>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteCharacter {
        correlation_id: Uuid::new_v4(),
        character_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_character command");

    command_handlers::handle_delete_character(&command, state.store.as_ref(), &state.hub).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /{id}/reveal
#[instrument(skip(state, _admin, request))]
async fn update_revealed_fields(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(character_id): Path<CharacterId>,
    Json(request): Json<RevealRequest>,
) -> Result<Json<CharacterWithFields>, ApiError> {
    let command = commands::UpdateRevealedFields {
        correlation_id: Uuid::new_v4(),
        fields: request.for_character(character_id),
    };

    info!(correlation_id = %command.correlation_id, "handling update_revealed_fields command");

    let updated = command_handlers::handle_update_revealed_fields(
        &command,
        state.store.as_ref(),
        &state.hub,
    )
    .await?;
    Ok(Json(updated))
}

/// POST /{id}/assign
#[instrument(skip(state, _admin, request), fields(player_id = %request.player_id))]
async fn assign_character(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(character_id): Path<CharacterId>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<CharacterWithActions>, ApiError> {
    let command = commands::AssignCharacter {
        correlation_id: Uuid::new_v4(),
        character_id,
        player_id: request.player_id,
    };

    info!(correlation_id = %command.correlation_id, "handling assign_character command");

    let assigned =
        command_handlers::handle_assign_character(&command, state.store.as_ref(), &state.hub)
            .await?;
    Ok(Json(assigned))
}

/// DELETE /{id}/assign
#[instrument(skip(state, _admin))]
async fn unassign_character(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(character_id): Path<CharacterId>,
) -> Result<Json<CharacterWithActions>, ApiError> {
    let command = commands::UnassignCharacter {
        correlation_id: Uuid::new_v4(),
        character_id,
    };

    info!(correlation_id = %command.correlation_id, "handling unassign_character command");

    let unassigned =
        command_handlers::handle_unassign_character(&command, state.store.as_ref(), &state.hub)
            .await?;
    Ok(Json(unassigned))
}

/// Returns the router for characters.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_characters).post(create_character))
        .route("/{id}", put(update_character).delete(delete_character))
        .route("/{id}/reveal", put(update_revealed_fields))
        .route("/{id}/assign", post(assign_character).delete(unassign_character))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use veil_core::repository::{CharacterRepository, PlayerRepository};
    use veil_core::viewer::Viewer;
    use veil_test_support::{FailingStore, InMemoryStore};

    use super::*;
    use crate::routes::testing::{TestApp, send};

    #[tokio::test]
    async fn test_create_character_returns_201_with_hidden_fields() {
        // Arrange
        let app = TestApp::new(Arc::new(InMemoryStore::new()));
        let cookie = app.cookie(Viewer::Admin);

        // Act
        let (status, json) = send(
            router().with_state(app.state.clone()),
            "POST",
            "/",
            Some(&cookie),
            Some(json!({ "name": "Grak", "race": "Orc" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["character"]["name"], "Grak");
        assert_eq!(json["character"]["race"], "Orc");
        assert_eq!(json["character"]["actions"], json!([]));
        assert_eq!(json["fields"]["name"], false);
    }

    #[tokio::test]
    async fn test_create_character_with_blank_name_returns_400() {
        let app = TestApp::new(Arc::new(InMemoryStore::new()));
        let cookie = app.cookie(Viewer::Admin);

        let (status, json) = send(
            router().with_state(app.state.clone()),
            "POST",
            "/",
            Some(&cookie),
            Some(json!({ "race": "Orc" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_routes_require_a_session() {
        let app = TestApp::new(Arc::new(InMemoryStore::new()));

        let (status, json) = send(router().with_state(app.state.clone()), "GET", "/", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_routes_reject_players() {
        let store = Arc::new(InMemoryStore::new());
        let player = store.create_player("Ada").await.unwrap();
        let app = TestApp::new(store);
        let cookie = app.cookie(Viewer::Player(player.id));

        let (status, json) = send(
            router().with_state(app.state.clone()),
            "GET",
            "/",
            Some(&cookie),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "forbidden");
    }

    #[tokio::test]
    async fn test_assign_unknown_player_returns_404() {
        let store = Arc::new(InMemoryStore::new());
        let (character, _) = store
            .create_character(&CharacterProfile {
                name: "Grak".to_owned(),
                ..CharacterProfile::default()
            })
            .await
            .unwrap();
        let app = TestApp::new(store);
        let cookie = app.cookie(Viewer::Admin);

        let (status, json) = send(
            router().with_state(app.state.clone()),
            "POST",
            &format!("/{}/assign", character.id),
            Some(&cookie),
            Some(json!({ "playerId": 999 })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_unassign_unowned_character_returns_409() {
        let store = Arc::new(InMemoryStore::new());
        let (character, _) = store
            .create_character(&CharacterProfile {
                name: "Grak".to_owned(),
                ..CharacterProfile::default()
            })
            .await
            .unwrap();
        let app = TestApp::new(store);
        let cookie = app.cookie(Viewer::Admin);

        let (status, json) = send(
            router().with_state(app.state.clone()),
            "DELETE",
            &format!("/{}/assign", character.id),
            Some(&cookie),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "invalid_state");
    }

    #[tokio::test]
    async fn test_list_characters_returns_500_when_store_fails() {
        let app = TestApp::new(Arc::new(FailingStore));
        let cookie = app.cookie(Viewer::Admin);

        let (status, json) = send(
            router().with_state(app.state.clone()),
            "GET",
            "/",
            Some(&cookie),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "store_error");
    }
}
