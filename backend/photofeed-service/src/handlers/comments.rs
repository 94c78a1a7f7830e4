/// Comment creation
///
/// Inserting a comment does not invalidate the post's cached comment data;
/// the feed lags until the entry expires (accepted consistency model).
use crate::db::{comment_repo, post_repo};
use crate::error::{AppError, Result};
use crate::handlers::{current_user, load_session, require_csrf};
use crate::services::IdentityResolver;
use crate::session::SessionStore;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: i64,
    pub comment: String,
    pub csrf_token: String,
}

pub async fn create_comment(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    resolver: web::Data<IdentityResolver>,
    sessions: web::Data<SessionStore>,
    body: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let session = load_session(&req, &sessions).await;
    let Some(me) = current_user(&session, &resolver).await else {
        return Err(AppError::Unauthorized("login required".to_string()));
    };
    require_csrf(&session, &body.csrf_token)?;

    if post_repo::one_with_author(&pool, body.post_id).await?.is_none() {
        return Err(AppError::NotFound("post not found".to_string()));
    }

    let comment_id = comment_repo::insert_comment(&pool, body.post_id, me.id, &body.comment).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "id": comment_id,
        "post_id": body.post_id,
    })))
}
