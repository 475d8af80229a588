// In-memory session store keyed by an opaque cookie token.
//
// Sessions live in a moka cache with time-to-idle expiry; nothing is written
// to disk. Only tokens this process issued are honored: an unknown cookie
// value gets a fresh session under a fresh token.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use moka::future::Cache;
use rand::Rng;

use crate::geography::GeographyTable;
use crate::session::Session;

pub const SESSION_COOKIE: &str = "aqi_session";

/// Session token plus whether it was minted for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId {
    token: String,
    issued: bool,
}

impl SessionId {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// True when the client has not seen this token yet.
    pub fn is_new(&self) -> bool {
        self.issued
    }

    /// Attach `Set-Cookie` to `response` if the token is new.
    pub fn apply_cookie(&self, response: &mut Response) {
        if !self.issued {
            return;
        }
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, self.token
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Could not encode session cookie: {}", e),
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<String, Session>,
    geography: Arc<GeographyTable>,
}

impl SessionStore {
    pub fn new(capacity: u64, ttl: Duration, geography: Arc<GeographyTable>) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(ttl)
            .build();
        Self { cache, geography }
    }

    /// Look up the caller's session, or start a new one on the input page.
    pub async fn resolve(&self, headers: &HeaderMap) -> (SessionId, Session) {
        if let Some(token) = session_token(headers) {
            if let Some(session) = self.cache.get(&token).await {
                return (
                    SessionId {
                        token,
                        issued: false,
                    },
                    session,
                );
            }
            tracing::debug!("Unknown or expired session token, starting a new session");
        }

        let id = SessionId {
            token: new_token(),
            issued: true,
        };
        (id, Session::new(&self.geography))
    }

    pub async fn save(&self, id: &SessionId, session: Session) {
        self.cache.insert(id.token.clone(), session).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

fn new_token() -> String {
    let value: u128 = rand::thread_rng().gen();
    format!("{:032x}", value)
}

/// Extract our cookie from (possibly several) `Cookie` headers.
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;

    fn store() -> SessionStore {
        SessionStore::new(
            100,
            Duration::from_secs(60),
            Arc::new(GeographyTable::reference()),
        )
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_token_parsing() {
        let headers = cookie_headers("theme=dark; aqi_session=abc123; other=1");
        assert_eq!(session_token(&headers), Some("abc123".to_string()));

        let headers = cookie_headers("theme=dark");
        assert_eq!(session_token(&headers), None);

        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_tokens_are_unique_hex() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_resolve_issues_new_session() {
        let store = store();
        let (id, session) = store.resolve(&HeaderMap::new()).await;
        assert!(id.is_new());
        assert_eq!(session.state(), SessionState::Input);
    }

    #[tokio::test]
    async fn test_saved_session_is_found_again() {
        let store = store();
        let (id, session) = store.resolve(&HeaderMap::new()).await;
        store.save(&id, session).await;

        let headers = cookie_headers(&format!("{}={}", SESSION_COOKIE, id.token()));
        let (again, _) = store.resolve(&headers).await;
        assert_eq!(again.token(), id.token());
        assert!(!again.is_new());
    }

    #[tokio::test]
    async fn test_entry_count_tracks_saved_sessions() {
        let store = store();
        for _ in 0..3 {
            let (id, session) = store.resolve(&HeaderMap::new()).await;
            store.save(&id, session).await;
        }
        store.cache.run_pending_tasks().await;
        assert_eq!(store.entry_count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_adopted() {
        let store = store();
        let headers = cookie_headers("aqi_session=forged");
        let (id, _) = store.resolve(&headers).await;
        assert!(id.is_new());
        assert_ne!(id.token(), "forged");
    }
}
