/// HTTP request handlers - thin glue over the services
///
/// Handlers resolve the session, call the identity resolver / feed assembler,
/// and shape JSON responses. All state-changing handlers check the session's
/// CSRF token.
pub mod admin;
pub mod auth;
pub mod comments;
pub mod feed;
pub mod posts;
pub mod users;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::IdentityResolver;
use crate::session::{self, SessionData, SessionStore, SESSION_COOKIE};
use actix_web::cookie::Cookie;
use actix_web::HttpRequest;

/// A request's session: its id (existing or freshly minted) and data.
pub struct RequestSession {
    pub id: String,
    pub data: SessionData,
}

/// Load the request's session, minting a new empty one when the cookie is
/// absent. The fresh session is only persisted if a handler saves it.
pub async fn load_session(req: &HttpRequest, sessions: &SessionStore) -> RequestSession {
    match session::session_id_from_request(req) {
        Some(id) => {
            let data = sessions.load(&id).await;
            RequestSession { id, data }
        }
        None => RequestSession {
            id: session::secure_random_hex(16),
            data: SessionData::default(),
        },
    }
}

/// Resolve the session's user, if any. Resolution failures read as
/// anonymous; they never fail the request.
pub async fn current_user(
    session: &RequestSession,
    resolver: &IdentityResolver,
) -> Option<User> {
    let user_id = session.data.user_id?;
    resolver.resolve(user_id).await
}

/// Reject state-changing requests whose token does not match the session.
pub fn require_csrf(session: &RequestSession, token: &str) -> Result<()> {
    let expected = session.data.csrf_token();
    if expected.is_empty() || expected != token {
        return Err(AppError::Forbidden("invalid csrf token".to_string()));
    }
    Ok(())
}

/// Session cookie for a (possibly new) session id.
pub fn session_cookie(session_id: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, session_id.to_owned())
        .path("/")
        .http_only(true)
        .finish()
}
