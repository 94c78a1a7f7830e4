/// User profile pages
use crate::config::Config;
use crate::db::{comment_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::handlers::{current_user, load_session};
use crate::models::{FeedItem, UserSummary};
use crate::services::{FeedAssembler, IdentityResolver};
use crate::session::SessionStore;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: UserSummary,
    pub posts: Vec<FeedItem>,
    pub post_count: usize,
    pub comment_count: i64,
    pub commented_count: i64,
    pub me: Option<UserSummary>,
}

/// A user's posts plus activity statistics. 404 for unknown or banned users.
pub async fn get_profile(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    assembler: web::Data<FeedAssembler>,
    resolver: web::Data<IdentityResolver>,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
    account_name: web::Path<String>,
) -> Result<HttpResponse> {
    let Some(user) = user_repo::find_active_by_account_name(&pool, &account_name).await? else {
        return Err(AppError::NotFound("user not found".to_string()));
    };

    let session = load_session(&req, &sessions).await;
    let me = current_user(&session, &resolver).await;
    let csrf_token = session.data.csrf_token();

    let rows = post_repo::by_user_with_author(&pool, user.id, config.feed.posts_per_page).await?;
    let posts = assembler.assemble(rows, &csrf_token, false).await?;

    let comment_count = comment_repo::count_by_user(&pool, user.id).await?;
    let post_ids = post_repo::ids_by_user(&pool, user.id).await?;
    let commented_count = comment_repo::count_by_posts(&pool, &post_ids).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: UserSummary::from(&user),
        posts,
        post_count: post_ids.len(),
        comment_count,
        commented_count,
        me: me.as_ref().map(UserSummary::from),
    }))
}
