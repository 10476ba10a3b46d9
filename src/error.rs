/// Error Handling Module
///
/// Every fallible operation in the crate returns one of the closed error
/// enumerations below. They are folded into `AppError`, which knows how to
/// turn itself into an HTTP response and how to log itself.
///
/// 1. Domain-specific error types (token, session, user, auth, validation)
/// 2. Unified application error type
/// 3. HTTP response mapping
/// 4. Error context enrichment

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Token codec failures, in the order validation checks them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token does not have exactly three dot-separated segments
    InvalidFormat { segments: usize },
    /// `issued_at` is older than `now - duration`
    Expired {
        issued_at: DateTime<Utc>,
        expiration: DateTime<Utc>,
    },
    /// The MAC does not match the header and payload segments
    InvalidSignature,
    /// The payload segment could not be decoded
    InvalidPayload(String),
    /// Header or payload could not be serialized, or signing failed
    Encoding(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InvalidFormat { segments } => {
                write!(f, "token: invalid format, got {} segments", segments)
            }
            TokenError::Expired {
                issued_at,
                expiration,
            } => write!(
                f,
                "token: expired, issued at {} before {}",
                issued_at.to_rfc3339(),
                expiration.to_rfc3339()
            ),
            TokenError::InvalidSignature => write!(f, "token: signature not valid"),
            TokenError::InvalidPayload(msg) => write!(f, "token: payload not valid: {}", msg),
            TokenError::Encoding(msg) => write!(f, "token: encoding failed: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// Session registry outcomes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NotFound,
    AlreadyExists,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound => write!(f, "Session not found"),
            SessionError::AlreadyExists => write!(f, "Session already exists"),
        }
    }
}

impl StdError for SessionError {}

/// User directory outcomes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserError {
    NotFound,
    AlreadyExists(String),
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserError::NotFound => write!(f, "User doesn't exist"),
            UserError::AlreadyExists(name) => write!(f, "User {} already registered", name),
        }
    }
}

impl StdError for UserError {}

/// Authentication and authorization errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    MissingToken(&'static str),
    Forbidden,
    CannotDeleteSelf,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Password not valid"),
            AuthError::MissingToken(cookie) => write!(f, "Missing {} cookie", cookie),
            AuthError::Forbidden => write!(f, "Forbidden"),
            AuthError::CannotDeleteSelf => write!(f, "A user cannot delete himself"),
        }
    }
}

impl StdError for AuthError {}

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooLong(&'static str, usize),
    SuspiciousContent(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} bytes)", field, max)
            }
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
        }
    }
}

impl StdError for ValidationError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Token(TokenError),
    Session(SessionError),
    User(UserError),
    Auth(AuthError),
    Validation(ValidationError),
    Config(config::ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Token(e) => write!(f, "{}", e),
            AppError::Session(e) => write!(f, "{}", e),
            AppError::User(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Token(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        AppError::User(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("bcrypt: {}", err))
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Token(e) => match e {
                TokenError::Expired { .. } => {
                    (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED", e.to_string())
                }
                TokenError::Encoding(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Something went wrong. Please try again later".to_string(),
                ),
                _ => (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_INVALID",
                    "Invalid or expired token".to_string(),
                ),
            },
            AppError::Session(e) => match e {
                SessionError::NotFound => {
                    (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", e.to_string())
                }
                SessionError::AlreadyExists => {
                    (StatusCode::CONFLICT, "SESSION_EXISTS", e.to_string())
                }
            },
            AppError::User(e) => match e {
                UserError::NotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND", e.to_string()),
                UserError::AlreadyExists(_) => {
                    (StatusCode::CONFLICT, "DUPLICATE_ENTRY", e.to_string())
                }
            },
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", e.to_string())
                }
                AuthError::MissingToken(_) => {
                    (StatusCode::UNAUTHORIZED, "MISSING_TOKEN", e.to_string())
                }
                AuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string()),
                AuthError::CannotDeleteSelf => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
            },
            AppError::Validation(e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                "Server configuration error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Something went wrong. Please try again later".to_string(),
            ),
        }
    }
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = self.classify();
        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );
        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Config(_) | AppError::Internal(_) => {
                tracing::error!(request_id = request_id, error = %self, "Internal error");
            }
            AppError::Token(TokenError::Encoding(_)) => {
                tracing::error!(request_id = request_id, error = %self, "Token encoding error");
            }
            AppError::Token(_) | AppError::Auth(_) => {
                tracing::warn!(request_id = request_id, error = %self, "Authentication error");
            }
            AppError::Session(_) | AppError::User(_) | AppError::Validation(_) => {
                tracing::warn!(request_id = request_id, error = %self, "Request rejected");
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context attached to log lines
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn log_error(&self, error: &AppError) {
        tracing::warn!(
            request_id = %self.request_id,
            operation = %self.operation,
            user_id = ?self.user_id,
            error = %error,
            "Operation failed"
        );
    }
}
