/// Authentication module
///
/// Token issuance/validation, token payloads and password hashing.

mod password;
mod payload;
mod token;

pub use password::hash_password;
pub use password::verify_password;
pub use payload::{AccessPayload, Header, RefreshPayload, TokenPayload, DEFAULT_HEADER};
pub use token::TokenCodec;
