//! Signed session cookies and the extractors that read them.
//!
//! The cookie value is `<subject>.<signature>`, where the subject is `admin`
//! or `player:<id>` and the signature is the unpadded base64url HMAC-SHA256
//! of the subject under the server's session secret.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use veil_core::error::DomainError;
use veil_core::ids::PlayerId;
use veil_core::viewer::Viewer;

use crate::error::{ApiError, AppError};
use crate::state::AppState;

/// Name of the session cookie.
pub const COOKIE_NAME: &str = "veil_session";

/// Display name used for the administrator's connection.
pub const ADMIN_NAME: &str = "Admin";

/// Signs and verifies session cookies.
#[derive(Clone)]
pub struct SessionSigner {
    mac: Hmac<Sha256>,
}

impl SessionSigner {
    /// Creates a signer keyed with `secret`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the key is rejected.
    pub fn new(secret: &[u8]) -> Result<Self, AppError> {
        let mac = Hmac::<Sha256>::new_from_slice(secret)
            .map_err(|e| AppError::Config(format!("SESSION_SECRET rejected: {e}")))?;
        Ok(Self { mac })
    }

    /// The signed token for `viewer`.
    #[must_use]
    pub fn sign(&self, viewer: Viewer) -> String {
        let subject = viewer.to_string();
        let mut mac = self.mac.clone();
        mac.update(subject.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{subject}.{signature}")
    }

    /// The viewer a token was signed for, if the signature checks out.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Viewer> {
        let (subject, signature) = token.rsplit_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(subject.as_bytes());
        mac.verify_slice(&signature).ok()?;
        parse_subject(subject)
    }

    /// A `Set-Cookie` value carrying the session for `viewer`.
    #[must_use]
    pub fn cookie(&self, viewer: Viewer) -> String {
        format!(
            "{COOKIE_NAME}={}; HttpOnly; Path=/; SameSite=Lax",
            self.sign(viewer)
        )
    }

    /// The verified viewer from a request's cookies, if any.
    #[must_use]
    pub fn viewer_from(&self, headers: &HeaderMap) -> Option<Viewer> {
        self.verify(cookie_value(headers, COOKIE_NAME)?)
    }
}

fn parse_subject(subject: &str) -> Option<Viewer> {
    if subject == "admin" {
        return Some(Viewer::Admin);
    }
    let id = subject.strip_prefix("player:")?.parse().ok()?;
    Some(Viewer::Player(PlayerId(id)))
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// A verified session. Player sessions are only accepted while the player
/// still exists.
#[derive(Debug, Clone)]
pub struct Session {
    /// Who the caller is.
    pub viewer: Viewer,
    /// The caller's display name.
    pub name: String,
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let viewer = state
            .sessions
            .viewer_from(&parts.headers)
            .ok_or(ApiError::Unauthorized("log in first"))?;

        match viewer {
            Viewer::Admin => Ok(Self {
                viewer,
                name: ADMIN_NAME.to_owned(),
            }),
            Viewer::Player(player_id) => match state.store.get_player(player_id).await {
                Ok(player) => Ok(Self {
                    viewer,
                    name: player.name,
                }),
                Err(DomainError::NotFound { .. }) => {
                    Err(ApiError::Unauthorized("player no longer exists; log in again"))
                }
                Err(err) => Err(err.into()),
            },
        }
    }
}

/// A verified administrator session.
#[derive(Debug, Clone, Copy)]
pub struct AdminSession;

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.sessions.viewer_from(&parts.headers) {
            Some(Viewer::Admin) => Ok(Self),
            Some(Viewer::Player(_)) => Err(ApiError::Forbidden),
            None => Err(ApiError::Unauthorized("log in first")),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn signer() -> SessionSigner {
        SessionSigner::new(b"test-secret").unwrap()
    }

    #[test]
    fn test_signed_tokens_verify_to_their_viewer() {
        let signer = signer();

        for viewer in [Viewer::Admin, Viewer::Player(PlayerId(42))] {
            assert_eq!(signer.verify(&signer.sign(viewer)), Some(viewer));
        }
    }

    #[test]
    fn test_sign_uses_readable_subject() {
        let token = signer().sign(Viewer::Player(PlayerId(7)));

        assert!(token.starts_with("player:7."));
    }

    #[test]
    fn test_tampered_subject_is_rejected() {
        let signer = signer();
        let token = signer.sign(Viewer::Player(PlayerId(7)));
        let forged = token.replacen("player:7", "admin", 1);

        assert_eq!(signer.verify(&forged), None);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = SessionSigner::new(b"someone-else").unwrap();

        assert_eq!(signer().verify(&other.sign(Viewer::Admin)), None);
        assert_eq!(signer().verify("admin"), None);
        assert_eq!(signer().verify("admin.%%%"), None);
    }

    #[test]
    fn test_viewer_from_finds_cookie_among_others() {
        let signer = signer();
        let mut headers = HeaderMap::new();
        let value = format!(
            "theme=dark; {COOKIE_NAME}={}; other=1",
            signer.sign(Viewer::Admin)
        );
        headers.insert(COOKIE, HeaderValue::from_str(&value).unwrap());

        assert_eq!(signer.viewer_from(&headers), Some(Viewer::Admin));
        assert_eq!(signer.viewer_from(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_has_session_attributes() {
        let cookie = signer().cookie(Viewer::Admin);

        assert!(cookie.starts_with("veil_session=admin."));
        assert!(cookie.ends_with("; HttpOnly; Path=/; SameSite=Lax"));
    }
}
