/// User Routes
///
/// Any authenticated caller may list users; creating and deleting users is
/// reserved to admins.

use actix_web::{web, HttpResponse};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::auth::AccessPayload;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::session::SessionRegistry;
use crate::users::{User, UserDirectory};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// GET /users
pub async fn list_users(
    _caller: web::ReqData<AccessPayload>,
    users: web::Data<RwLock<UserDirectory>>,
) -> HttpResponse {
    HttpResponse::Ok().json(UsersResponse {
        users: users.read().list(),
    })
}

/// POST /users
///
/// # Errors
/// - 403: caller is not an admin
/// - 400: invalid name or password
/// - 409: name already registered
pub async fn create_user(
    caller: web::ReqData<AccessPayload>,
    body: web::Json<NewUserRequest>,
    users: web::Data<RwLock<UserDirectory>>,
) -> Result<HttpResponse, AppError> {
    require_admin(&caller)?;

    let body = body.into_inner();
    // hash before locking; only the duplicate check and insert hold the guard
    let bcrypt_cost = users.read().bcrypt_cost();
    let user = User::new(&body.name, &body.password, body.is_admin, bcrypt_cost)?;
    let user = users.write().insert(user)?;

    Ok(HttpResponse::Created().json(user))
}

/// DELETE /users/{id}
///
/// Also revokes every session the user still holds.
///
/// # Errors
/// - 403: caller is not an admin
/// - 400: caller tries to delete their own account
/// - 404: no user with this id
pub async fn delete_user(
    caller: web::ReqData<AccessPayload>,
    path: web::Path<String>,
    users: web::Data<RwLock<UserDirectory>>,
    sessions: web::Data<RwLock<SessionRegistry>>,
) -> Result<HttpResponse, AppError> {
    require_admin(&caller)?;
    let context = ErrorContext::new("delete_user").with_user_id(caller.user_id.clone());

    let id = path.into_inner();
    if id == caller.user_id {
        return Err(AuthError::CannotDeleteSelf.into());
    }

    let removed = users.write().delete(&id).map_err(|e| {
        let e = AppError::from(e);
        context.log_error(&e);
        e
    })?;

    let mut registry = sessions.write();
    let revoked = registry.list_for_user(&removed.id);
    for session in &revoked {
        registry.delete(&session.refresh_identity)?;
    }
    drop(registry);

    tracing::info!(
        request_id = %context.request_id,
        user_id = %removed.id,
        revoked_sessions = revoked.len(),
        deleted_by = %caller.user_id,
        "User deleted"
    );

    Ok(HttpResponse::Ok().finish())
}

fn require_admin(caller: &AccessPayload) -> Result<(), AuthError> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
