//! Login and identity routes.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use veil_core::error::DomainError;
use veil_core::ids::PlayerId;
use veil_core::model::Player;
use veil_core::viewer::Viewer;
use veil_game::application::command_handlers;
use veil_game::domain::commands;

use crate::error::ApiError;
use crate::session::ADMIN_NAME;
use crate::state::AppState;

/// Request body for POST /login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// A display name, or the administrator key.
    pub name: String,
}

/// Who the caller is.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    /// The caller's player id. Absent for the administrator and for anonymous callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PlayerId>,
    /// The caller's display name. Absent for anonymous callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the caller holds the administrator role.
    pub is_admin: bool,
}

impl IdentityResponse {
    fn admin() -> Self {
        Self {
            id: None,
            name: Some(ADMIN_NAME.to_owned()),
            is_admin: true,
        }
    }

    fn player(player: Player) -> Self {
        Self {
            id: Some(player.id),
            name: Some(player.name),
            is_admin: false,
        }
    }

    fn anonymous() -> Self {
        Self {
            id: None,
            name: None,
            is_admin: false,
        }
    }
}

fn signed_in(
    state: &AppState,
    viewer: Viewer,
    body: IdentityResponse,
) -> impl IntoResponse + use<> {
    ([(SET_COOKIE, state.sessions.cookie(viewer))], Json(body))
}

/// POST /login
///
/// The administrator key yields an administrator session. Anyone else gets a
/// player: their current one renamed if their session is still valid, a new
/// one otherwise.
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.name == *state.admin_key {
        info!("administrator logged in");
        return Ok(signed_in(&state, Viewer::Admin, IdentityResponse::admin()));
    }

    let command = commands::RegisterPlayer {
        correlation_id: Uuid::new_v4(),
        existing: state.sessions.viewer_from(&headers).and_then(Viewer::player_id),
        name: request.name,
    };

    info!(correlation_id = %command.correlation_id, "handling login");

    let player = command_handlers::handle_register_player(&command, state.store.as_ref()).await?;
    let viewer = Viewer::Player(player.id);
    Ok(signed_in(&state, viewer, IdentityResponse::player(player)))
}

/// GET /status
async fn status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<IdentityResponse>, ApiError> {
    let identity = match state.sessions.viewer_from(&headers) {
        None => IdentityResponse::anonymous(),
        Some(Viewer::Admin) => IdentityResponse::admin(),
        Some(Viewer::Player(player_id)) => match state.store.get_player(player_id).await {
            Ok(player) => IdentityResponse::player(player),
            Err(DomainError::NotFound { .. }) => IdentityResponse::anonymous(),
            Err(err) => return Err(err.into()),
        },
    };
    Ok(Json(identity))
}

/// Returns the router for login and identity.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/status", get(status))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::header::{CONTENT_TYPE, COOKIE};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;
    use veil_core::repository::PlayerRepository;
    use veil_test_support::InMemoryStore;

    use super::*;
    use crate::routes::testing::{ADMIN_KEY, TestApp, send};

    async fn post_login(app: &TestApp, name: &str, cookie: Option<&str>) -> (StatusCode, String) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/login")
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let request = request
            .body(Body::from(json!({ "name": name }).to_string()))
            .unwrap();

        let response = router()
            .with_state(app.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .map(|value| value.to_str().unwrap().to_owned())
            .unwrap_or_default();
        (response.status(), cookie)
    }

    #[tokio::test]
    async fn test_login_with_admin_key_sets_admin_session() {
        let app = TestApp::new(Arc::new(InMemoryStore::new()));

        let (status, cookie) = post_login(&app, ADMIN_KEY, None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(cookie.starts_with("veil_session=admin."));
        assert!(app.state.store.list_players().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_creates_then_renames_player() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let app = TestApp::new(store.clone());

        // Act
        let (_, first) = post_login(&app, "Ada", None).await;
        let session = first.split(';').next().unwrap().to_owned();
        let (status, second) = post_login(&app, "Ada Lovelace", Some(&session)).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        let players = store.list_players().await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Ada Lovelace");
        assert!(second.starts_with(&format!("veil_session=player:{}.", players[0].id)));
    }

    #[tokio::test]
    async fn test_login_with_blank_name_returns_400() {
        let app = TestApp::new(Arc::new(InMemoryStore::new()));

        let (status, cookie) = post_login(&app, "   ", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(cookie.is_empty());
    }

    #[tokio::test]
    async fn test_status_reports_identity() {
        let store = Arc::new(InMemoryStore::new());
        let player = store.create_player("Ada").await.unwrap();
        let app = TestApp::new(store);

        let (_, anonymous) = send(router().with_state(app.state.clone()), "GET", "/status", None, None).await;
        let (_, admin) = send(
            router().with_state(app.state.clone()),
            "GET",
            "/status",
            Some(&app.cookie(Viewer::Admin)),
            None,
        )
        .await;
        let (_, ada) = send(
            router().with_state(app.state.clone()),
            "GET",
            "/status",
            Some(&app.cookie(Viewer::Player(player.id))),
            None,
        )
        .await;

        assert_eq!(anonymous, json!({ "isAdmin": false }));
        assert_eq!(admin, json!({ "name": "Admin", "isAdmin": true }));
        assert_eq!(ada, json!({ "id": player.id, "name": "Ada", "isAdmin": false }));
    }
}
