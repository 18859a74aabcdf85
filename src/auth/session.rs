use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Principal;

pub const SESSION_COOKIE: &str = "sid";

/// Server-side state for one logged-in browser
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub id: String,
    pub username: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-memory session table keyed by random id. Cookies carry
/// `<id>.<signature>` so a forged or truncated value never reaches the map.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    signer: Hmac<Sha256>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            signer: Hmac::<Sha256>::new_from_slice(secret.as_bytes())
                .expect("HMAC accepts keys of any length"),
            ttl: Duration::hours(ttl_hours as i64),
        }
    }

    fn sign(&self, id: &str) -> String {
        let mut mac = self.signer.clone();
        mac.update(id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Split and verify a cookie value, returning the session id
    fn unsign<'a>(&self, cookie_value: &'a str) -> Option<&'a str> {
        let (id, signature) = cookie_value.split_once('.')?;
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.signer.clone();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok().map(|_| id)
    }

    /// Start a session for a verified principal; returns it with the cookie value
    pub async fn create(&self, principal: &Principal) -> (Session, String) {
        let now = Utc::now();
        let id = Uuid::new_v4().simple().to_string();
        let session = Session {
            id: id.clone(),
            username: principal.username.clone(),
            is_admin: principal.is_admin,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(id.clone(), session.clone());

        let cookie_value = format!("{}.{}", id, self.sign(&id));
        (session, cookie_value)
    }

    /// Live session for a cookie value, if any. Expired sessions are dropped.
    pub async fn lookup(&self, cookie_value: &str) -> Option<Session> {
        let id = self.unsign(cookie_value)?;
        let now = Utc::now();

        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(id);
        None
    }

    /// Forget a session; returns whether one existed
    pub async fn destroy(&self, cookie_value: &str) -> bool {
        match self.unsign(cookie_value) {
            Some(id) => self.sessions.write().await.remove(id).is_some(),
            None => false,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Value of the session cookie from the request's `Cookie` headers
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// `Set-Cookie` value that stores the session cookie
pub fn set_cookie(value: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        value,
        max_age.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_cookie(secure: bool) -> String {
    set_cookie("", Duration::zero(), secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn admin() -> Principal {
        Principal {
            username: "admin".to_string(),
            is_admin: true,
        }
    }

    #[tokio::test]
    async fn test_create_lookup_destroy() {
        let store = SessionStore::new("secret", 1);
        let (session, cookie) = store.create(&admin()).await;
        assert!(cookie.starts_with(&session.id));

        let found = store.lookup(&cookie).await.unwrap();
        assert_eq!(found.username, "admin");
        assert!(found.is_admin);

        assert!(store.destroy(&cookie).await);
        assert!(store.lookup(&cookie).await.is_none());
        assert!(!store.destroy(&cookie).await);
    }

    #[tokio::test]
    async fn test_rejects_tampered_cookies() {
        let store = SessionStore::new("secret", 1);
        let (session, cookie) = store.create(&admin()).await;

        assert!(store.lookup(&session.id).await.is_none());
        assert!(store.lookup(&format!("{}.deadbeef", session.id)).await.is_none());
        assert!(store.lookup(&format!("{}.not-hex", session.id)).await.is_none());

        let (_, signature) = cookie.split_once('.').unwrap();
        assert_eq!(signature.len(), 64);
        let flipped = format!(
            "{}.{}{}",
            session.id,
            if signature.starts_with('0') { '1' } else { '0' },
            &signature[1..]
        );
        assert!(store.lookup(&flipped).await.is_none());
        assert!(store.lookup(&cookie).await.is_some());

        let other = SessionStore::new("different-secret", 1);
        assert!(other.lookup(&cookie).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_dropped() {
        let store = SessionStore::new("secret", 0);
        let (_, cookie) = store.create(&admin()).await;
        assert!(store.lookup(&cookie).await.is_none());
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; sid=abc.def; other=1"));
        assert_eq!(session_cookie(&headers), Some("abc.def"));

        let empty = HeaderMap::new();
        assert_eq!(session_cookie(&empty), None);

        let cookie = set_cookie("abc.def", Duration::hours(2), true);
        assert_eq!(cookie, "sid=abc.def; Path=/; HttpOnly; SameSite=Lax; Max-Age=7200; Secure");
        assert!(clear_cookie(false).contains("Max-Age=0"));
    }
}
