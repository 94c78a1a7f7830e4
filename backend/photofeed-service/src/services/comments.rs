/// Comment aggregator - batch cache-aside enrichment of posts
///
/// For a batch of posts, resolves each post's comment count and comment list
/// through the cache with a single multi-key fetch, falling back to the
/// relational store per miss and repopulating the cache best-effort.
///
/// A single enrichment issues one cache round trip plus 0..2N store queries
/// (N = misses across count/comments keys). Concurrent enrichments may race
/// to populate the same key; last write wins.
use crate::db::CommentStore;
use crate::error::{AppError, Result};
use crate::metrics::cache::{CACHE_EVENTS, CACHE_WRITE_TOTAL};
use crate::models::{CommentView, FeedItem, PostRow};
use cache_store::CacheStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct CommentAggregator {
    cache: Arc<dyn CacheStore>,
    comments: Arc<dyn CommentStore>,
    ttl: Duration,
}

impl CommentAggregator {
    pub fn new(cache: Arc<dyn CacheStore>, comments: Arc<dyn CommentStore>, ttl: Duration) -> Self {
        Self {
            cache,
            comments,
            ttl,
        }
    }

    fn comment_count_key(post_id: i64) -> String {
        format!("post:{}:comment_count", post_id)
    }

    fn comments_key(post_id: i64) -> String {
        format!("post:{}:comments", post_id)
    }

    /// Enrich `rows` with comment counts and comment lists, preserving input
    /// order. `all_comments` selects the full list (post detail) over the
    /// latest 3 (feed and profile pages).
    ///
    /// Failure of the batched cache read or of any store fallback aborts the
    /// whole enrichment; no partial feed is returned.
    pub async fn enrich(&self, rows: Vec<PostRow>, all_comments: bool) -> Result<Vec<FeedItem>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::with_capacity(rows.len() * 2);
        for row in &rows {
            keys.push(Self::comment_count_key(row.id));
            keys.push(Self::comments_key(row.id));
        }

        // One round trip for the whole batch, regardless of feed size. The
        // batch carries both count and comment keys, so its failures are
        // counted under their own kind.
        let cached = self.cache.get_multi(&keys).await.map_err(|e| {
            CACHE_EVENTS.with_label_values(&["batch", "error"]).inc();
            AppError::CacheError(format!("batch comment fetch failed: {}", e))
        })?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let post_id = row.id;
            let comment_count = self.resolve_count(&cached, post_id).await?;
            let comments = self.resolve_comments(&cached, post_id, all_comments).await?;
            items.push(FeedItem::new(row, comment_count, comments));
        }

        Ok(items)
    }

    async fn resolve_count(&self, cached: &HashMap<String, Vec<u8>>, post_id: i64) -> Result<i64> {
        let key = Self::comment_count_key(post_id);

        if let Some(raw) = cached.get(&key) {
            CACHE_EVENTS
                .with_label_values(&["comment_count", "hit"])
                .inc();
            return parse_count(raw, post_id);
        }

        CACHE_EVENTS
            .with_label_values(&["comment_count", "miss"])
            .inc();
        let count = self.comments.count_for_post(post_id).await?;

        match self
            .cache
            .set(&key, count.to_string().as_bytes(), self.ttl)
            .await
        {
            Ok(()) => {
                CACHE_WRITE_TOTAL
                    .with_label_values(&["comment_count", "success"])
                    .inc();
            }
            Err(e) => {
                warn!("failed to cache comment count for post {}: {}", post_id, e);
                CACHE_WRITE_TOTAL
                    .with_label_values(&["comment_count", "error"])
                    .inc();
            }
        }

        Ok(count)
    }

    async fn resolve_comments(
        &self,
        cached: &HashMap<String, Vec<u8>>,
        post_id: i64,
        all_comments: bool,
    ) -> Result<Vec<CommentView>> {
        let key = Self::comments_key(post_id);

        if let Some(raw) = cached.get(&key) {
            CACHE_EVENTS.with_label_values(&["comments", "hit"]).inc();
            // Cached form is already in ascending display order.
            let comments: Vec<CommentView> = serde_json::from_slice(raw).map_err(|e| {
                AppError::CacheError(format!(
                    "malformed cached comments for post {}: {}",
                    post_id, e
                ))
            })?;
            return Ok(comments);
        }

        CACHE_EVENTS.with_label_values(&["comments", "miss"]).inc();
        debug!("comments cache MISS for post {}", post_id);

        // Store query selects newest-first; display (and cached) order is
        // ascending, so reverse before anything else touches the list.
        let mut comments = self.comments.recent_for_post(post_id, all_comments).await?;
        comments.reverse();

        match serde_json::to_vec(&comments) {
            Ok(bytes) => match self.cache.set(&key, &bytes, self.ttl).await {
                Ok(()) => {
                    CACHE_WRITE_TOTAL
                        .with_label_values(&["comments", "success"])
                        .inc();
                }
                Err(e) => {
                    warn!("failed to cache comments for post {}: {}", post_id, e);
                    CACHE_WRITE_TOTAL
                        .with_label_values(&["comments", "error"])
                        .inc();
                }
            },
            Err(e) => warn!("failed to serialize comments for post {}: {}", post_id, e),
        }

        Ok(comments)
    }
}

/// Parse a cached comment count. A value that is not a non-negative integer
/// is a hard error for the whole batch, never silently read as zero.
fn parse_count(raw: &[u8], post_id: i64) -> Result<i64> {
    let count = std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            AppError::CacheError(format!("malformed cached comment count for post {}", post_id))
        })?;

    if count < 0 {
        return Err(AppError::CacheError(format!(
            "negative cached comment count {} for post {}",
            count, post_id
        )));
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_formats() {
        assert_eq!(
            CommentAggregator::comment_count_key(42),
            "post:42:comment_count"
        );
        assert_eq!(CommentAggregator::comments_key(42), "post:42:comments");
    }

    #[test]
    fn parse_count_accepts_non_negative_integers() {
        assert_eq!(parse_count(b"0", 1).unwrap(), 0);
        assert_eq!(parse_count(b"417", 1).unwrap(), 417);
    }

    #[test]
    fn parse_count_rejects_garbage() {
        assert!(parse_count(b"", 1).is_err());
        assert!(parse_count(b"4.2", 1).is_err());
        assert!(parse_count(b"not a number", 1).is_err());
        assert!(parse_count(&[0xff, 0xfe], 1).is_err());
    }

    #[test]
    fn parse_count_rejects_negative_values() {
        assert!(parse_count(b"-1", 1).is_err());
    }
}
