mod auth;
mod health_check;
mod sessions;
mod users;

pub use auth::{login, logout, refresh, AuthResponse, REFRESH_TOKEN_COOKIE};
pub use health_check::health_check;
pub use sessions::{delete_session, list_sessions, SessionsResponse};
pub use users::{create_user, delete_user, list_users, UsersResponse};
