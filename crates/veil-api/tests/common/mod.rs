//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tokio::sync::watch;
use tower::ServiceExt;
use veil_api::session::{COOKIE_NAME, SessionSigner};
use veil_api::state::AppState;
use veil_core::viewer::Viewer;
use veil_game::application::presence::SnapshotOnConnect;
use veil_stream::{EventHub, HubHandle};
use veil_test_support::InMemoryStore;

pub const ADMIN_KEY: &str = "integration-admin-key";

/// The full app backed by an in-memory store and a live event hub that pushes
/// initial snapshots. The hub stops when this is dropped.
pub struct TestServer {
    pub app: Router,
    pub store: Arc<InMemoryStore>,
    pub hub: HubHandle,
    sessions: SessionSigner,
    _shutdown: watch::Sender<bool>,
}

/// Build the full app router the same way `main.rs` does, minus transport layers.
pub fn build_test_app() -> TestServer {
    let store = Arc::new(InMemoryStore::new());
    let (hub, handle) = EventHub::new();
    let (shutdown, signal) = watch::channel(false);
    hub.with_listener(Arc::new(SnapshotOnConnect::new(store.clone(), handle.clone())))
        .spawn(signal);

    let sessions = SessionSigner::new(b"integration-secret").unwrap();
    let state = AppState::new(store.clone(), handle.clone(), sessions.clone(), ADMIN_KEY);

    TestServer {
        app: veil_api::app(state),
        store,
        hub: handle,
        sessions,
        _shutdown: shutdown,
    }
}

impl TestServer {
    /// A `Cookie` header value carrying a session for `viewer`.
    pub fn cookie(&self, viewer: Viewer) -> String {
        format!("{COOKIE_NAME}={}", self.sessions.sign(viewer))
    }

    /// Send a request as `viewer` and return the status and JSON body
    /// (`Null` for empty bodies).
    pub async fn request(
        &self,
        viewer: Viewer,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(COOKIE, self.cookie(viewer));
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body_bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap()
        };

        (status, json)
    }

    /// Send a request as the administrator.
    pub async fn as_admin(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        self.request(Viewer::Admin, method, uri, body).await
    }

    /// Create a character through the API and return its id.
    pub async fn create_character(&self, body: serde_json::Value) -> i64 {
        let (status, json) = self
            .as_admin("POST", "/api/v1/characters", Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
        json["character"]["id"].as_i64().unwrap()
    }

    /// Create an action through the API and return its id.
    pub async fn create_action(&self, character_id: i64, content: &str) -> i64 {
        let (status, json) = self
            .as_admin(
                "POST",
                "/api/v1/actions",
                Some(serde_json::json!({ "characterId": character_id, "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
        json["id"].as_i64().unwrap()
    }

    /// POST /api/v1/login, optionally presenting an existing `Cookie` header.
    /// Returns the status, the new `Cookie` header value and the JSON body.
    pub async fn login(
        &self,
        name: &str,
        cookie: Option<&str>,
    ) -> (StatusCode, Option<String>, serde_json::Value) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/v1/login")
            .header(CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        let request = request
            .body(Body::from(
                serde_json::to_vec(&serde_json::json!({ "name": name })).unwrap(),
            ))
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_owned);
        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body_bytes).unwrap();

        (status, cookie, json)
    }

    /// GET a URI presenting a raw `Cookie` header.
    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header(COOKIE, cookie)
            .body(Body::empty())
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body_bytes).unwrap();

        (status, json)
    }
}
