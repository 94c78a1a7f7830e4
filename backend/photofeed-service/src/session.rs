/// Cache-backed session collaborator
///
/// Sessions live in the same key/value cache as the read-through entries: an
/// opaque session id cookie maps to a JSON `SessionData` record with a TTL.
/// The core services never see cookies; handlers resolve the session and
/// pass `user_id` / `csrf_token` down.
use crate::error::{AppError, Result};
use actix_web::HttpRequest;
use cache_store::CacheStore;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Name of the session id cookie.
pub const SESSION_COOKIE: &str = "photofeed_session";

/// Per-session state. `csrf_token` authorizes state-changing requests;
/// `notice` is a one-shot flash message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Option<i64>,
    pub csrf_token: Option<String>,
    pub notice: Option<String>,
}

impl SessionData {
    pub fn csrf_token(&self) -> String {
        self.csrf_token.clone().unwrap_or_default()
    }
}

pub struct SessionStore {
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    fn session_key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }

    /// Load the session for an id. Missing, expired, or malformed entries
    /// read as a fresh anonymous session; a cache failure does too, logged.
    pub async fn load(&self, session_id: &str) -> SessionData {
        let key = Self::session_key(session_id);
        match self.cache.get(&key).await {
            Ok(Some(raw)) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!("malformed session entry, starting fresh: {}", e);
                SessionData::default()
            }),
            Ok(None) => SessionData::default(),
            Err(e) => {
                warn!("session load failed: {}", e);
                SessionData::default()
            }
        }
    }

    pub async fn save(&self, session_id: &str, data: &SessionData) -> Result<()> {
        let key = Self::session_key(session_id);
        let bytes = serde_json::to_vec(data)?;
        self.cache
            .set(&key, &bytes, self.ttl)
            .await
            .map_err(|e| AppError::CacheError(format!("session save failed: {}", e)))
    }

    /// Drop the session by overwriting it with an anonymous record. The
    /// cache interface has no delete; the entry expires with the TTL.
    pub async fn destroy(&self, session_id: &str) -> Result<()> {
        self.save(session_id, &SessionData::default()).await
    }
}

/// Session id from the request cookie, if any.
pub fn session_id_from_request(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Fresh random identifier, also used for CSRF tokens.
pub fn secure_random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cache_store::MemoryCacheStore;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryCacheStore::new()), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let sessions = store();
        let data = SessionData {
            user_id: Some(7),
            csrf_token: Some("token".to_string()),
            notice: None,
        };

        sessions.save("sid", &data).await.unwrap();
        assert_eq!(sessions.load("sid").await, data);
    }

    #[tokio::test]
    async fn unknown_session_reads_as_anonymous() {
        let sessions = store();
        assert_eq!(sessions.load("nope").await, SessionData::default());
    }

    #[tokio::test]
    async fn destroy_clears_user() {
        let sessions = store();
        let data = SessionData {
            user_id: Some(7),
            csrf_token: Some("token".to_string()),
            notice: None,
        };
        sessions.save("sid", &data).await.unwrap();

        sessions.destroy("sid").await.unwrap();
        assert_eq!(sessions.load("sid").await.user_id, None);
    }

    #[test]
    fn secure_random_hex_length_and_uniqueness() {
        let a = secure_random_hex(16);
        let b = secure_random_hex(16);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
