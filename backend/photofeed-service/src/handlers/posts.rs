/// Post detail and creation
use crate::db::post_repo;
use crate::error::{AppError, Result};
use crate::handlers::{current_user, load_session, require_csrf};
use crate::models::{extension_for_mime, UserSummary};
use crate::services::{FeedAssembler, IdentityResolver};
use crate::session::SessionStore;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Single post with its full comment list.
pub async fn get_post(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    assembler: web::Data<FeedAssembler>,
    resolver: web::Data<IdentityResolver>,
    sessions: web::Data<SessionStore>,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let session = load_session(&req, &sessions).await;
    let me = current_user(&session, &resolver).await;
    let csrf_token = session.data.csrf_token();

    let Some(row) = post_repo::one_with_author(&pool, *post_id).await? else {
        return Err(AppError::NotFound("post not found".to_string()));
    };

    let mut items = assembler.assemble(vec![row], &csrf_token, true).await?;
    let post = items.remove(0);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "post": post,
        "me": me.as_ref().map(UserSummary::from),
    })))
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub mime: String,
    pub body: String,
    pub csrf_token: String,
}

#[derive(Serialize)]
pub struct CreatePostResponse {
    pub id: i64,
    pub image_path: String,
}

/// Create a post. Image bytes are written by the external image storage
/// collaborator; this records mime and caption and returns the path the
/// image is expected at.
pub async fn create_post(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    resolver: web::Data<IdentityResolver>,
    sessions: web::Data<SessionStore>,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let session = load_session(&req, &sessions).await;
    let Some(me) = current_user(&session, &resolver).await else {
        return Err(AppError::Unauthorized("login required".to_string()));
    };
    require_csrf(&session, &body.csrf_token)?;

    let Some(ext) = extension_for_mime(&body.mime) else {
        return Err(AppError::ValidationError(
            "only jpeg, png and gif images can be posted".to_string(),
        ));
    };

    let post_id = post_repo::insert_post(&pool, me.id, &body.mime, &body.body).await?;

    Ok(HttpResponse::Created().json(CreatePostResponse {
        id: post_id,
        image_path: format!("/image/{}.{}", post_id, ext),
    }))
}
