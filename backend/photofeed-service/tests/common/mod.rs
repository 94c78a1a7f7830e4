//! In-memory fakes for the store and cache seams.
#![allow(dead_code)]

use async_trait::async_trait;
use cache_store::{CacheError, CacheStore, MemoryCacheStore};
use chrono::{DateTime, TimeZone, Utc};
use photofeed_service::db::{CommentStore, UserStore};
use photofeed_service::error::{AppError, Result};
use photofeed_service::models::{CommentView, PostRow, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn post_row(id: i64, user_id: i64, created_secs: i64) -> PostRow {
    PostRow {
        id,
        user_id,
        body: format!("caption {}", id),
        mime: "image/jpeg".to_string(),
        created_at: ts(created_secs),
        account_name: format!("author_{}", user_id),
    }
}

pub fn comment(id: i64, post_id: i64, created_secs: i64) -> CommentView {
    CommentView {
        id,
        post_id,
        user_id: 100 + id,
        body: format!("comment {}", id),
        created_at: ts(created_secs),
        account_name: format!("commenter_{}", id),
    }
}

pub fn user(id: i64, deleted: bool) -> User {
    User {
        id,
        account_name: format!("user_{}", id),
        passhash: "x".repeat(128),
        authority: 0,
        deleted,
        created_at: ts(0),
    }
}

/// Comment source of truth backed by a map, with query counters.
#[derive(Default)]
pub struct FakeCommentStore {
    comments: Mutex<HashMap<i64, Vec<CommentView>>>,
    pub count_queries: AtomicUsize,
    pub list_queries: AtomicUsize,
}

impl FakeCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, post_id: i64, comments: Vec<CommentView>) {
        self.comments.lock().unwrap().insert(post_id, comments);
    }

    pub fn count_queries(&self) -> usize {
        self.count_queries.load(Ordering::SeqCst)
    }

    pub fn list_queries(&self) -> usize {
        self.list_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentStore for FakeCommentStore {
    async fn count_for_post(&self, post_id: i64) -> Result<i64> {
        self.count_queries.fetch_add(1, Ordering::SeqCst);
        let comments = self.comments.lock().unwrap();
        Ok(comments.get(&post_id).map_or(0, |c| c.len() as i64))
    }

    async fn recent_for_post(&self, post_id: i64, all_comments: bool) -> Result<Vec<CommentView>> {
        self.list_queries.fetch_add(1, Ordering::SeqCst);
        let comments = self.comments.lock().unwrap();
        let mut rows = comments.get(&post_id).cloned().unwrap_or_default();
        // Newest first, like the SQL query.
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if !all_comments {
            rows.truncate(3);
        }
        Ok(rows)
    }
}

/// Comment store whose every query fails.
pub struct BrokenCommentStore;

#[async_trait]
impl CommentStore for BrokenCommentStore {
    async fn count_for_post(&self, _post_id: i64) -> Result<i64> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }

    async fn recent_for_post(&self, _post_id: i64, _all: bool) -> Result<Vec<CommentView>> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }
}

/// User source of truth backed by a map, with a query counter.
#[derive(Default)]
pub struct FakeUserStore {
    users: Mutex<HashMap<i64, User>>,
    pub queries: AtomicUsize,
}

impl FakeUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for FakeUserStore {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
}

/// User store whose every query fails.
pub struct BrokenUserStore;

#[async_trait]
impl UserStore for BrokenUserStore {
    async fn find_by_id(&self, _user_id: i64) -> Result<Option<User>> {
        Err(AppError::DatabaseError("connection refused".to_string()))
    }
}

/// Cache wrapper that counts round trips per operation.
#[derive(Default)]
pub struct CountingCache {
    pub inner: MemoryCacheStore,
    pub get_calls: AtomicUsize,
    pub get_multi_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_multi_calls(&self) -> usize {
        self.get_multi_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for CountingCache {
    async fn get(&self, key: &str) -> cache_store::Result<Option<Vec<u8>>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn get_multi(
        &self,
        keys: &[String],
    ) -> cache_store::Result<HashMap<String, Vec<u8>>> {
        self.get_multi_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_multi(keys).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> cache_store::Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl).await
    }
}

/// Cache whose every operation fails, simulating a cache outage.
pub struct BrokenCache;

#[async_trait]
impl CacheStore for BrokenCache {
    async fn get(&self, _key: &str) -> cache_store::Result<Option<Vec<u8>>> {
        Err(CacheError::Backend("cache unreachable".to_string()))
    }

    async fn get_multi(&self, _keys: &[String]) -> cache_store::Result<HashMap<String, Vec<u8>>> {
        Err(CacheError::Backend("cache unreachable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> cache_store::Result<()> {
        Err(CacheError::Backend("cache unreachable".to_string()))
    }
}

/// Cache that reads fine but rejects writes, for write-back failure paths.
#[derive(Default)]
pub struct ReadOnlyCache {
    pub inner: MemoryCacheStore,
}

#[async_trait]
impl CacheStore for ReadOnlyCache {
    async fn get(&self, key: &str) -> cache_store::Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn get_multi(&self, keys: &[String]) -> cache_store::Result<HashMap<String, Vec<u8>>> {
        self.inner.get_multi(keys).await
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> cache_store::Result<()> {
        Err(CacheError::Backend("write rejected".to_string()))
    }
}
