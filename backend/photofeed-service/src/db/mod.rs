/// Database access layer
///
/// Repositories are free functions over `&PgPool` with bound parameters
/// only. The `UserStore` and `CommentStore` traits are the seams the
/// cache-aside services depend on; `PgUserStore` / `PgCommentStore` are the
/// production implementations over the repositories.
pub mod comment_repo;
pub mod post_repo;
pub mod user_repo;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{CommentView, User};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

/// Create the shared Postgres connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> std::result::Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.url)
        .await?;

    info!(
        max_connections = config.max_connections,
        "database pool created"
    );

    Ok(pool)
}

/// Source of truth for user records, as seen by the identity resolver.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>>;
}

/// Source of truth for per-post comment data, as seen by the comment
/// aggregator on cache misses.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// `COUNT(*)` of comments on the post.
    async fn count_for_post(&self, post_id: i64) -> Result<i64>;

    /// Comments joined to their authors, ordered `created_at` descending,
    /// capped at 3 unless `all_comments`.
    async fn recent_for_post(&self, post_id: i64, all_comments: bool) -> Result<Vec<CommentView>>;
}

/// Postgres-backed `UserStore`.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        user_repo::find_by_id(&self.pool, user_id).await
    }
}

/// Postgres-backed `CommentStore`.
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn count_for_post(&self, post_id: i64) -> Result<i64> {
        comment_repo::count_by_post(&self.pool, post_id).await
    }

    async fn recent_for_post(&self, post_id: i64, all_comments: bool) -> Result<Vec<CommentView>> {
        comment_repo::recent_by_post(&self.pool, post_id, all_comments).await
    }
}
