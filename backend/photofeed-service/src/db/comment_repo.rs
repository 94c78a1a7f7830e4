/// Comment database operations
use crate::error::Result;
use crate::models::CommentView;
use sqlx::PgPool;

/// Count comments on a post.
pub async fn count_by_post(pool: &PgPool, post_id: i64) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Comments on a post joined to their authors, newest first, capped at 3
/// unless `all_comments`. The aggregator reverses to display order.
pub async fn recent_by_post(
    pool: &PgPool,
    post_id: i64,
    all_comments: bool,
) -> Result<Vec<CommentView>> {
    let mut query = String::from(
        r#"
        SELECT c.id, c.post_id, c.user_id, c.body, c.created_at, u.account_name
        FROM comments AS c
        JOIN users AS u ON c.user_id = u.id
        WHERE c.post_id = $1
        ORDER BY c.created_at DESC
        "#,
    );
    if !all_comments {
        query.push_str(" LIMIT 3");
    }

    let comments = sqlx::query_as::<_, CommentView>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;

    Ok(comments)
}

/// Create a comment, returning the assigned id.
pub async fn insert_comment(
    pool: &PgPool,
    post_id: i64,
    user_id: i64,
    body: &str,
) -> Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO comments (post_id, user_id, body) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(post_id)
    .bind(user_id)
    .bind(body)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Comments written by a user, for profile statistics.
pub async fn count_by_user(pool: &PgPool, user_id: i64) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Comments received across a set of posts, for profile statistics.
pub async fn count_by_posts(pool: &PgPool, post_ids: &[i64]) -> Result<i64> {
    if post_ids.is_empty() {
        return Ok(0);
    }

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = ANY($1)")
            .bind(post_ids)
            .fetch_one(pool)
            .await?;

    Ok(count)
}
