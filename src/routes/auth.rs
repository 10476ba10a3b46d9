/// Authentication Routes
///
/// Login, access-token refresh and logout. Tokens travel in HttpOnly
/// cookies; the JSON body echoes the access payload for the client.

use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AccessPayload, RefreshPayload, TokenCodec};
use crate::clock::Clock;
use crate::error::{AppError, AuthError, ErrorContext, UserError, ValidationError};
use crate::middleware::ACCESS_TOKEN_COOKIE;
use crate::session::{DeviceData, RefreshIdentity, SessionRegistry};
use crate::users::UserDirectory;

pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Login form
#[derive(Deserialize)]
pub struct LoginForm {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Body returned by login and refresh
#[derive(Serialize)]
pub struct AuthResponse {
    #[serde(rename = "userData")]
    pub user_data: AccessPayload,
}

/// POST /auth/login
///
/// Authenticate with form fields `name` and `password`.
/// Sets the `accessToken` and `refreshToken` cookies and registers a
/// session bound to the refresh token.
///
/// # Errors
/// - 400: name or password missing
/// - 404: user doesn't exist
/// - 401: password not valid
/// - 409: a session for this refresh identity already exists
pub async fn login(
    req: HttpRequest,
    form: web::Form<LoginForm>,
    users: web::Data<RwLock<UserDirectory>>,
    sessions: web::Data<RwLock<SessionRegistry>>,
    access_codec: web::Data<TokenCodec<AccessPayload>>,
    refresh_codec: web::Data<TokenCodec<RefreshPayload>>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let form = form.into_inner();

    let name = non_empty(form.name, "name")?;
    let password = non_empty(form.password, "password")?;

    // bcrypt runs outside the directory lock
    let user = users.read().get_by_name(&name).cloned();
    let user = user
        .map_err(AppError::from)
        .and_then(|user| user.check_password(&password).map(|()| user))
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    // both tokens share one instant so the refresh identity matches the access token
    let now = clock.now();
    let access_payload = AccessPayload {
        user_id: user.id.clone(),
        issued_at: now,
        is_admin: user.is_admin,
    };
    let refresh_payload = RefreshPayload {
        user_id: user.id.clone(),
        issued_at: now,
    };
    let access_token = access_codec.issue(&access_payload)?;
    let refresh_token = refresh_codec.issue(&refresh_payload)?;

    let session_id = open_session(
        &users,
        &sessions,
        RefreshIdentity::from(&refresh_payload),
        device_data(&req),
    )?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        session_id = %session_id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok()
        .cookie(token_cookie(ACCESS_TOKEN_COOKIE, access_token))
        .cookie(token_cookie(REFRESH_TOKEN_COOKIE, refresh_token))
        .json(AuthResponse {
            user_data: access_payload,
        }))
}

/// POST /auth/refresh
///
/// Mint a new access token from the `refreshToken` cookie. The refresh
/// token itself is not rotated; the session's last activity is updated.
///
/// # Errors
/// - 401: missing, malformed, expired or tampered refresh token
/// - 404: no session for this refresh token, or its user is gone
pub async fn refresh(
    req: HttpRequest,
    users: web::Data<RwLock<UserDirectory>>,
    sessions: web::Data<RwLock<SessionRegistry>>,
    access_codec: web::Data<TokenCodec<AccessPayload>>,
    refresh_codec: web::Data<TokenCodec<RefreshPayload>>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let payload = verified_refresh_payload(&req, &refresh_codec)?;
    let identity = RefreshIdentity::from(&payload);

    let session = sessions.read().find_by_identity(&identity)?.clone();
    let user = users.read().get_by_id(session.user_id())?.clone();

    let access_payload = AccessPayload {
        user_id: user.id.clone(),
        issued_at: clock.now(),
        is_admin: user.is_admin,
    };
    let access_token = access_codec.issue(&access_payload)?;
    sessions.write().touch(&session)?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        session_id = %session.id,
        "Access token refreshed"
    );

    Ok(HttpResponse::Ok()
        .cookie(token_cookie(ACCESS_TOKEN_COOKIE, access_token))
        .json(AuthResponse {
            user_data: access_payload,
        }))
}

/// POST /auth/logout
///
/// Delete the session bound to the `refreshToken` cookie and clear both
/// token cookies.
///
/// # Errors
/// - 401: missing or invalid refresh token
/// - 404: the session was already revoked
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<RwLock<SessionRegistry>>,
    refresh_codec: web::Data<TokenCodec<RefreshPayload>>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_logout");

    let payload = verified_refresh_payload(&req, &refresh_codec)?;
    let removed = sessions.write().delete(&RefreshIdentity::from(&payload))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %removed.user_id(),
        session_id = %removed.id,
        "User logged out"
    );

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
        .finish())
}

/// Register a session, then confirm its user still exists.
///
/// `delete_user` removes the user before revoking their sessions, so either
/// it sees this session or this check sees the user gone.
fn open_session(
    users: &RwLock<UserDirectory>,
    sessions: &RwLock<SessionRegistry>,
    identity: RefreshIdentity,
    device_data: DeviceData,
) -> Result<Uuid, AppError> {
    let session_id = sessions.write().create(identity.clone(), device_data)?;

    if users.read().get_by_id(&identity.user_id).is_err() {
        // may already be gone if delete_user got there first
        sessions.write().delete(&identity).ok();
        return Err(UserError::NotFound.into());
    }

    Ok(session_id)
}

fn verified_refresh_payload(
    req: &HttpRequest,
    codec: &TokenCodec<RefreshPayload>,
) -> Result<RefreshPayload, AppError> {
    let cookie = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .ok_or(AuthError::MissingToken(REFRESH_TOKEN_COOKIE))?;
    Ok(codec.verify(cookie.value())?)
}

fn non_empty(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::EmptyField(field)),
    }
}

fn device_data(req: &HttpRequest) -> DeviceData {
    DeviceData {
        ip_address: req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default(),
        user_agent: req
            .headers()
            .get("User-Agent")
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    }
}

fn token_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value).path("/").http_only(true).finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = token_cookie(name, String::new());
    cookie.make_removal();
    cookie
}
