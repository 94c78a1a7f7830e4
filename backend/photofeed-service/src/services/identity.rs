/// Identity resolver - session user id to hydrated user record
///
/// Read-through cache over the users table. Every failure on this path
/// degrades to "anonymous" rather than failing the request: a cache outage,
/// a malformed cached value, or a store error all resolve to `None` with a
/// logged diagnostic.
use crate::db::UserStore;
use crate::metrics::cache::{CACHE_EVENTS, CACHE_WRITE_TOTAL};
use crate::models::User;
use cache_store::CacheStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub struct IdentityResolver {
    cache: Arc<dyn CacheStore>,
    users: Arc<dyn UserStore>,
    ttl: Duration,
}

impl IdentityResolver {
    pub fn new(cache: Arc<dyn CacheStore>, users: Arc<dyn UserStore>, ttl: Duration) -> Self {
        Self { cache, users, ttl }
    }

    fn user_key(user_id: i64) -> String {
        format!("user:{}", user_id)
    }

    /// Resolve a session's user id to a user record.
    ///
    /// The cached snapshot may be stale relative to the store; in particular
    /// a ban (`deleted = true`) is not observed until the entry expires.
    pub async fn resolve(&self, user_id: i64) -> Option<User> {
        let key = Self::user_key(user_id);

        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_slice::<User>(&raw) {
                Ok(user) => {
                    debug!("identity cache HIT for user {}", user_id);
                    CACHE_EVENTS.with_label_values(&["user", "hit"]).inc();
                    Some(user)
                }
                Err(e) => {
                    // Treated as absence: one bad entry must not crash the
                    // request, the caller just appears logged out.
                    error!("failed to deserialize cached user {}: {}", user_id, e);
                    CACHE_EVENTS.with_label_values(&["user", "error"]).inc();
                    None
                }
            },
            Ok(None) => {
                debug!("identity cache MISS for user {}", user_id);
                CACHE_EVENTS.with_label_values(&["user", "miss"]).inc();
                self.resolve_from_store(&key, user_id).await
            }
            Err(e) => {
                warn!("cache read failed for user {}: {}", user_id, e);
                CACHE_EVENTS.with_label_values(&["user", "error"]).inc();
                None
            }
        }
    }

    async fn resolve_from_store(&self, key: &str, user_id: i64) -> Option<User> {
        let user = match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("user {} not found in store", user_id);
                return None;
            }
            Err(e) => {
                error!("user lookup failed for {}: {}", user_id, e);
                return None;
            }
        };

        // Write-back is best-effort; the resolved user is returned either way.
        match serde_json::to_vec(&user) {
            Ok(bytes) => match self.cache.set(key, &bytes, self.ttl).await {
                Ok(()) => {
                    CACHE_WRITE_TOTAL
                        .with_label_values(&["user", "success"])
                        .inc();
                }
                Err(e) => {
                    warn!("failed to cache user {}: {}", user_id, e);
                    CACHE_WRITE_TOTAL
                        .with_label_values(&["user", "error"])
                        .inc();
                }
            },
            Err(e) => warn!("failed to serialize user {} for cache: {}", user_id, e),
        }

        Some(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_key_format() {
        assert_eq!(IdentityResolver::user_key(42), "user:42");
    }
}
