/// Post database operations
///
/// Feed queries join posts to users so soft-deleted authors are excluded at
/// selection time, and return `PostRow` (post columns plus account name).
use crate::error::Result;
use crate::models::PostRow;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

const POST_ROW_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.body, p.mime, p.created_at, u.account_name
    FROM posts AS p
    JOIN users AS u ON p.user_id = u.id
"#;

/// Latest posts by non-deleted authors, newest first.
pub async fn latest_with_authors(pool: &PgPool, limit: i64) -> Result<Vec<PostRow>> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "{POST_ROW_SELECT} WHERE u.deleted = FALSE ORDER BY p.created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Posts at or before the cursor timestamp, newest first.
pub async fn before_with_authors(
    pool: &PgPool,
    max_created_at: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<PostRow>> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "{POST_ROW_SELECT} WHERE p.created_at <= $1 AND u.deleted = FALSE \
         ORDER BY p.created_at DESC LIMIT $2"
    ))
    .bind(max_created_at)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// One user's posts, newest first.
pub async fn by_user_with_author(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<PostRow>> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "{POST_ROW_SELECT} WHERE p.user_id = $1 AND u.deleted = FALSE \
         ORDER BY p.created_at DESC LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// A single post, absent when the post or its author is gone.
pub async fn one_with_author(pool: &PgPool, post_id: i64) -> Result<Option<PostRow>> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "{POST_ROW_SELECT} WHERE p.id = $1 AND u.deleted = FALSE"
    ))
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Create a post, returning the assigned id. Image bytes are handed to the
/// external image storage by the caller; only mime and caption live here.
pub async fn insert_post(pool: &PgPool, user_id: i64, mime: &str, body: &str) -> Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO posts (user_id, mime, body) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(mime)
    .bind(body)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Ids of all posts by a user, for profile statistics.
pub async fn ids_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<i64>> {
    let ids: Vec<(i64,)> = sqlx::query_as("SELECT id FROM posts WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(ids.into_iter().map(|(id,)| id).collect())
}
