/// User database operations
use crate::error::Result;
use crate::models::User;
use sqlx::PgPool;

/// Find a user by id, including soft-deleted users. The identity resolver
/// caches whatever it reads here; the ban flag is checked at login and at
/// feed-query time, not on every session resolution.
pub async fn find_by_id(pool: &PgPool, user_id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, account_name, passhash, authority, deleted, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Find an active (not soft-deleted) user by account name.
pub async fn find_active_by_account_name(
    pool: &PgPool,
    account_name: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, account_name, passhash, authority, deleted, created_at
        FROM users
        WHERE account_name = $1 AND deleted = FALSE
        "#,
    )
    .bind(account_name)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Whether an account name is already registered.
pub async fn account_name_taken(pool: &PgPool, account_name: &str) -> Result<bool> {
    let (taken,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE account_name = $1)")
            .bind(account_name)
            .fetch_one(pool)
            .await?;

    Ok(taken)
}

/// Register a new user, returning the assigned id.
pub async fn insert_user(pool: &PgPool, account_name: &str, passhash: &str) -> Result<i64> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (account_name, passhash) VALUES ($1, $2) RETURNING id",
    )
    .bind(account_name)
    .bind(passhash)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Active non-admin users, newest first, for the admin ban listing.
pub async fn list_active_normal(pool: &PgPool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, account_name, passhash, authority, deleted, created_at
        FROM users
        WHERE authority = 0 AND deleted = FALSE
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Soft-delete a user. The identity cache is deliberately not invalidated;
/// the cached record reads as active until it expires.
pub async fn ban_user(pool: &PgPool, user_id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET deleted = TRUE WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
