/// Feed pages: the main reverse-chronological feed and cursor paging
use crate::config::Config;
use crate::db::post_repo;
use crate::error::{AppError, Result};
use crate::handlers::{current_user, load_session};
use crate::models::{FeedItem, UserSummary};
use crate::services::{FeedAssembler, IdentityResolver};
use crate::session::SessionStore;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Serialize)]
pub struct FeedResponse {
    pub posts: Vec<FeedItem>,
    pub me: Option<UserSummary>,
    pub csrf_token: String,
}

/// Latest posts by active authors, enriched through the cache.
pub async fn get_feed(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    assembler: web::Data<FeedAssembler>,
    resolver: web::Data<IdentityResolver>,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse> {
    let session = load_session(&req, &sessions).await;
    let me = current_user(&session, &resolver).await;
    let csrf_token = session.data.csrf_token();

    let rows = post_repo::latest_with_authors(&pool, config.feed.posts_per_page).await?;
    let posts = assembler.assemble(rows, &csrf_token, false).await?;

    Ok(HttpResponse::Ok().json(FeedResponse {
        posts,
        me: me.as_ref().map(UserSummary::from),
        csrf_token,
    }))
}

#[derive(Deserialize)]
pub struct FeedPageQuery {
    pub max_created_at: String,
}

/// Older feed pages, keyed by an ISO-8601 cursor timestamp.
pub async fn get_posts(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    assembler: web::Data<FeedAssembler>,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
    query: web::Query<FeedPageQuery>,
) -> Result<HttpResponse> {
    let max_created_at = DateTime::parse_from_rfc3339(&query.max_created_at)
        .map_err(|e| AppError::BadRequest(format!("invalid max_created_at: {}", e)))?
        .with_timezone(&Utc);

    let session = load_session(&req, &sessions).await;
    let csrf_token = session.data.csrf_token();

    let rows =
        post_repo::before_with_authors(&pool, max_created_at, config.feed.posts_per_page).await?;
    let posts = assembler.assemble(rows, &csrf_token, false).await?;

    if posts.is_empty() {
        return Err(AppError::NotFound("no posts".to_string()));
    }

    Ok(HttpResponse::Ok().json(posts))
}
