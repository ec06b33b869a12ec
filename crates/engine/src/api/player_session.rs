//! Player identity at the HTTP boundary.
//!
//! The player key travels in the `quiz_player` cookie, or in an
//! `X-Player-Id` header for non-browser clients. Requests without a valid
//! key get a freshly minted one, handed back through `Set-Cookie`.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue},
    response::{IntoResponse, Response},
};
use uuid::Uuid;
use wappenquiz_domain::PlayerKey;

pub const COOKIE_NAME: &str = "quiz_player";
pub const PLAYER_ID_HEADER: &str = "x-player-id";

const COOKIE_MAX_AGE_SECS: i64 = 365 * 24 * 3600;

/// The requesting player's key.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub key: PlayerKey,
    /// True if the key was minted for this request.
    pub issued: bool,
}

impl PlayerSession {
    /// Attach `Set-Cookie` to `response` when the key is new.
    pub fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.issued {
            if let Ok(value) = HeaderValue::from_str(&session_cookie(&self.key)) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}

impl<S> FromRequestParts<S> for PlayerSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_cookie = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|h| parse_cookie(h, COOKIE_NAME))
            .and_then(|raw| PlayerKey::new(raw).ok());

        let from_header = || {
            parts
                .headers
                .get(PLAYER_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|raw| PlayerKey::new(raw.trim()).ok())
        };

        match from_cookie.or_else(from_header) {
            Some(key) => Ok(Self { key, issued: false }),
            None => {
                let key = PlayerKey::from_uuid(Uuid::new_v4());
                tracing::debug!(player = %key, "Issued new player key");
                Ok(Self { key, issued: true })
            }
        }
    }
}

/// `Set-Cookie` value carrying `key`.
pub fn session_cookie(key: &PlayerKey) -> String {
    format!(
        "{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={COOKIE_MAX_AGE_SECS}",
        key.as_str()
    )
}

/// Parse a specific cookie from the Cookie header string.
fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(name)
            .and_then(|value| value.strip_prefix('='))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    async fn whoami(session: PlayerSession) -> Response {
        let body = format!("{}:{}", session.key, session.issued);
        session.respond(body)
    }

    async fn call(request: Request<Body>) -> (Option<String>, String) {
        let app = Router::new().route("/", get(whoami));
        let response = app.oneshot(request).await.unwrap();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (cookie, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn parse_cookie_works() {
        assert_eq!(parse_cookie("quiz_player=abc; other=x", COOKIE_NAME), Some("abc"));
        assert_eq!(parse_cookie("other=x;quiz_player=abc", COOKIE_NAME), Some("abc"));
        assert_eq!(parse_cookie("quiz_player_old=abc", COOKIE_NAME), None);
        assert_eq!(parse_cookie("other=x", COOKIE_NAME), None);
    }

    #[tokio::test]
    async fn existing_cookie_is_used() {
        let request = Request::builder()
            .uri("/")
            .header(header::COOKIE, "theme=dark; quiz_player=alice_01")
            .body(Body::empty())
            .unwrap();

        let (cookie, body) = call(request).await;
        assert_eq!(body, "alice_01:false");
        assert!(cookie.is_none());
    }

    #[tokio::test]
    async fn header_is_accepted() {
        let request = Request::builder()
            .uri("/")
            .header("X-Player-Id", "bot-7")
            .body(Body::empty())
            .unwrap();

        let (_, body) = call(request).await;
        assert_eq!(body, "bot-7:false");
    }

    #[tokio::test]
    async fn missing_or_malformed_key_is_minted() {
        let request = Request::builder()
            .uri("/")
            .header(header::COOKIE, "quiz_player=../../etc/passwd")
            .body(Body::empty())
            .unwrap();

        let (cookie, body) = call(request).await;
        let (key, issued) = body.split_once(':').unwrap();
        assert_eq!(issued, "true");
        assert!(Uuid::parse_str(key).is_ok());
        let cookie = cookie.unwrap();
        assert!(cookie.starts_with(&format!("quiz_player={key};")));
        assert!(cookie.contains("HttpOnly"));
    }
}
