/// Admin ban management
///
/// Banning soft-deletes users. Cached identity snapshots are not
/// invalidated; a banned user's cached record keeps reading as active until
/// the entry expires.
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::handlers::{current_user, load_session, require_csrf};
use crate::models::{User, UserSummary};
use crate::services::IdentityResolver;
use crate::session::SessionStore;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

async fn require_admin(
    req: &HttpRequest,
    sessions: &SessionStore,
    resolver: &IdentityResolver,
) -> Result<(crate::handlers::RequestSession, User)> {
    let session = load_session(req, sessions).await;
    let Some(me) = current_user(&session, resolver).await else {
        return Err(AppError::Unauthorized("login required".to_string()));
    };
    if !me.is_admin() {
        return Err(AppError::Forbidden("admin authority required".to_string()));
    }
    Ok((session, me))
}

/// Active non-admin users, candidates for banning.
pub async fn get_banned(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    resolver: web::Data<IdentityResolver>,
    sessions: web::Data<SessionStore>,
) -> Result<HttpResponse> {
    let (session, _) = require_admin(&req, &sessions, &resolver).await?;

    let users = user_repo::list_active_normal(&pool).await?;
    let users: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "users": users,
        "csrf_token": session.data.csrf_token(),
    })))
}

#[derive(Deserialize)]
pub struct BanRequest {
    pub uids: Vec<i64>,
    pub csrf_token: String,
}

/// Soft-delete the listed users.
pub async fn post_banned(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    resolver: web::Data<IdentityResolver>,
    sessions: web::Data<SessionStore>,
    body: web::Json<BanRequest>,
) -> Result<HttpResponse> {
    let (session, _) = require_admin(&req, &sessions, &resolver).await?;
    require_csrf(&session, &body.csrf_token)?;

    for uid in &body.uids {
        user_repo::ban_user(&pool, *uid).await?;
    }

    Ok(HttpResponse::NoContent().finish())
}
