/// Session Routes
///
/// Listing and revocation of sessions. Admins see and revoke every session;
/// other callers only their own. Both require a valid access token.

use actix_web::{web, HttpResponse};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AccessPayload;
use crate::error::{AppError, AuthError, SessionError};
use crate::session::{Session, SessionRegistry};

#[derive(Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
}

/// GET /sessions
pub async fn list_sessions(
    caller: web::ReqData<AccessPayload>,
    sessions: web::Data<RwLock<SessionRegistry>>,
) -> HttpResponse {
    let sessions = if caller.is_admin {
        sessions.read().list_all()
    } else {
        sessions.read().list_for_user(&caller.user_id)
    };

    HttpResponse::Ok().json(SessionsResponse { sessions })
}

/// DELETE /sessions/{id}
///
/// # Errors
/// - 404: no session with this id
/// - 403: the session belongs to another user and the caller is not an admin
pub async fn delete_session(
    caller: web::ReqData<AccessPayload>,
    path: web::Path<String>,
    sessions: web::Data<RwLock<SessionRegistry>>,
) -> Result<HttpResponse, AppError> {
    let id = Uuid::parse_str(&path).map_err(|_| SessionError::NotFound)?;

    let mut registry = sessions.write();
    let identity = {
        let session = registry.find_by_id(&id)?;
        if !caller.is_admin && session.user_id() != caller.user_id {
            return Err(AuthError::Forbidden.into());
        }
        session.refresh_identity.clone()
    };
    registry.delete(&identity)?;
    drop(registry);

    tracing::info!(
        session_id = %id,
        revoked_by = %caller.user_id,
        "Session revoked"
    );

    Ok(HttpResponse::Ok().finish())
}
