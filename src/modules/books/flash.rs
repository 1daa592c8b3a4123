//! One-shot values carried across a single redirect.
//!
//! A browser is identified by a cookie holding a random UUID. Values written
//! with [`Flash::set`] stay in process memory until the next
//! [`Flash::take`] of the same key, or until they are older than the
//! configured TTL.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap, HeaderValue};
use serde_json::Value;
use shelf_kernel::settings::FlashSettings;
use tokio::sync::Mutex;
use uuid::Uuid;

struct Bucket {
    values: HashMap<String, Value>,
    written_at: Instant,
}

/// Per-session flash storage shared by all requests.
pub struct FlashStore {
    ttl: Duration,
    cookie_name: String,
    sessions: Mutex<HashMap<String, Bucket>>,
}

impl FlashStore {
    pub fn new(settings: &FlashSettings) -> Self {
        Self {
            ttl: Duration::from_secs(settings.ttl_secs),
            cookie_name: settings.cookie_name.clone(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Store `value` under `key` for `session`, replacing any unread value.
    pub async fn set(&self, session: &str, key: &str, value: Value) {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        let ttl = self.ttl;
        sessions.retain(|_, bucket| now.duration_since(bucket.written_at) < ttl);

        let bucket = sessions.entry(session.to_string()).or_insert_with(|| Bucket {
            values: HashMap::new(),
            written_at: now,
        });
        bucket.written_at = now;
        bucket.values.insert(key.to_string(), value);
    }

    /// Read and clear `key` for `session`.
    pub async fn take(&self, session: &str, key: &str) -> Option<Value> {
        let mut sessions = self.sessions.lock().await;
        let bucket = sessions.get_mut(session)?;

        if bucket.written_at.elapsed() >= self.ttl {
            sessions.remove(session);
            return None;
        }

        let value = bucket.values.remove(key);
        if bucket.values.is_empty() {
            sessions.remove(session);
        }
        value
    }

    fn session_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .and_then(|(_, value)| Uuid::parse_str(value).ok())
            .map(|id| id.to_string())
    }
}

/// Request-scoped handle onto the caller's flash session.
pub struct Flash {
    store: Arc<FlashStore>,
    session: String,
    minted: bool,
}

impl Flash {
    pub async fn set(&self, key: &str, value: Value) {
        self.store.set(&self.session, key, value).await;
    }

    pub async fn take(&self, key: &str) -> Option<Value> {
        self.store.take(&self.session, key).await
    }

    /// `Set-Cookie` value for a session id minted during this request.
    pub fn cookie(&self) -> Option<HeaderValue> {
        if !self.minted {
            return None;
        }
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.store.cookie_name, self.session
        );
        HeaderValue::from_str(&cookie).ok()
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
    Arc<FlashStore>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = Arc::<FlashStore>::from_ref(state);
        let flash = match store.session_from_headers(&parts.headers) {
            Some(session) => Flash {
                store,
                session,
                minted: false,
            },
            None => Flash {
                store,
                session: Uuid::new_v4().to_string(),
                minted: true,
            },
        };
        Ok(flash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(ttl_secs: u64) -> FlashStore {
        FlashStore::new(&FlashSettings {
            ttl_secs,
            cookie_name: "shelf_flash".to_string(),
        })
    }

    #[tokio::test]
    async fn take_reads_once() {
        let store = store(60);
        store.set("s1", "error", json!(["Title is required"])).await;

        assert_eq!(
            store.take("s1", "error").await,
            Some(json!(["Title is required"]))
        );
        assert_eq!(store.take("s1", "error").await, None);
    }

    #[tokio::test]
    async fn keys_and_sessions_are_independent() {
        let store = store(60);
        store.set("s1", "error", json!(["e"])).await;
        store.set("s1", "book", json!({"Title": "x"})).await;

        assert_eq!(store.take("s2", "error").await, None);
        assert!(store.take("s1", "book").await.is_some());
        assert!(store.take("s1", "error").await.is_some());
    }

    #[tokio::test]
    async fn expired_values_are_dropped() {
        let store = store(0);
        store.set("s1", "error", json!(["e"])).await;
        assert_eq!(store.take("s1", "error").await, None);
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let store = store(60);
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; shelf_flash={id}")).unwrap(),
        );
        assert_eq!(store.session_from_headers(&headers), Some(id.to_string()));
    }

    #[test]
    fn malformed_session_cookie_is_ignored() {
        let store = store(60);
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("shelf_flash=../../etc"),
        );
        assert_eq!(store.session_from_headers(&headers), None);
    }
}
