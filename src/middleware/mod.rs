/// Middleware module
///
/// Custom middleware for authentication.

mod access_token;

pub use access_token::{AccessTokenMiddleware, ACCESS_TOKEN_COOKIE};
