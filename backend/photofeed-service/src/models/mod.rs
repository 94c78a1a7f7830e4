/// Data models for photofeed-service
///
/// - `User`: account record, soft-deleted via the `deleted` flag
/// - `PostRow`: a post joined to its author's account name, as selected for
///   feed pages (image bytes live with the external image storage)
/// - `CommentView`: a comment denormalized with the commenting user's
///   account name at read time; this is the form cached per post
/// - `FeedItem`: a post enriched with derived comment data for one render
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user. Cached copies have an independent lifetime; mutations
/// of `deleted` are not observed by the cache until the entry expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub account_name: String,
    pub passhash: String,
    pub authority: i16,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.authority == 1
    }
}

/// A post row as selected by the feed queries: post columns plus the
/// author's account name from the users join.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub body: String,
    pub mime: String,
    pub created_at: DateTime<Utc>,
    pub account_name: String,
}

/// A comment joined to its author's account name. This is the unit cached
/// under `post:{id}:comments`, always in ascending display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentView {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub account_name: String,
}

/// A fully hydrated, render-ready post. `comment_count` and `comments` are
/// derived by the comment aggregator; `csrf_token` is copied from the
/// caller's session and never cached.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub id: i64,
    pub user_id: i64,
    pub body: String,
    pub mime: String,
    pub created_at: DateTime<Utc>,
    pub account_name: String,
    pub comment_count: i64,
    pub comments: Vec<CommentView>,
    pub csrf_token: String,
}

impl FeedItem {
    /// Build a feed item from a post row and its derived comment data.
    pub fn new(row: PostRow, comment_count: i64, comments: Vec<CommentView>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            body: row.body,
            mime: row.mime,
            created_at: row.created_at,
            account_name: row.account_name,
            comment_count,
            comments,
            csrf_token: String::new(),
        }
    }
}

/// Public projection of a user for JSON responses; never exposes `passhash`.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub account_name: String,
    pub authority: i16,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            account_name: user.account_name.clone(),
            authority: user.authority,
        }
    }
}

/// Image mime types accepted for posts.
pub const ALLOWED_MIMES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

/// File extension for an accepted mime type.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_covers_allowed_mimes() {
        for mime in ALLOWED_MIMES {
            assert!(extension_for_mime(mime).is_some());
        }
        assert_eq!(extension_for_mime("image/webp"), None);
    }
}
