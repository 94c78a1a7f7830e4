/// Registration, login, and logout
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::handlers::{load_session, session_cookie};
use crate::models::UserSummary;
use crate::services::auth;
use crate::session::{secure_random_hex, SessionData, SessionStore};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub account_name: String,
    pub password: String,
}

/// Register a new account and open a session for it.
pub async fn register(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionStore>,
    body: web::Json<CredentialsRequest>,
) -> Result<HttpResponse> {
    let mut session = load_session(&req, &sessions).await;
    if session.data.user_id.is_some() {
        return Err(AppError::BadRequest("already logged in".to_string()));
    }

    if !auth::validate_user(&body.account_name, &body.password) {
        return Err(AppError::ValidationError(
            "account name must be 3+ word characters, password 6+".to_string(),
        ));
    }

    if user_repo::account_name_taken(&pool, &body.account_name).await? {
        return Err(AppError::Conflict(
            "account name is already in use".to_string(),
        ));
    }

    let passhash = auth::calculate_passhash(&body.account_name, &body.password);
    let user_id = user_repo::insert_user(&pool, &body.account_name, &passhash).await?;

    session.data = SessionData {
        user_id: Some(user_id),
        csrf_token: Some(secure_random_hex(16)),
        notice: None,
    };
    sessions.save(&session.id, &session.data).await?;

    Ok(HttpResponse::Created()
        .cookie(session_cookie(&session.id))
        .json(serde_json::json!({
            "id": user_id,
            "account_name": body.account_name,
        })))
}

/// Log in against active accounts.
pub async fn login(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    sessions: web::Data<SessionStore>,
    body: web::Json<CredentialsRequest>,
) -> Result<HttpResponse> {
    let mut session = load_session(&req, &sessions).await;
    if session.data.user_id.is_some() {
        return Err(AppError::BadRequest("already logged in".to_string()));
    }

    let Some(user) = auth::try_login(&pool, &body.account_name, &body.password).await? else {
        return Err(AppError::Unauthorized(
            "wrong account name or password".to_string(),
        ));
    };

    session.data = SessionData {
        user_id: Some(user.id),
        csrf_token: Some(secure_random_hex(16)),
        notice: None,
    };
    sessions.save(&session.id, &session.data).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&session.id))
        .json(UserSummary::from(&user)))
}

/// Drop the session.
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<SessionStore>,
) -> Result<HttpResponse> {
    let session = load_session(&req, &sessions).await;
    sessions.destroy(&session.id).await?;
    Ok(HttpResponse::NoContent().finish())
}
