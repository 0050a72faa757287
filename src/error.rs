/// Unified error handling for the API.
///
/// Authentication failures form a single closed set (`AuthError`); every
/// layer of the token pipeline returns members of that set only, so the
/// HTTP status mapping below is total. All authentication failures map to
/// a uniform 401 body: the specific kind is logged server-side and never
/// echoed to the client.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
        }
    }
}

impl StdError for ValidationError {}

/// Authentication and authorization failures.
///
/// `InvalidToken` covers every parse, signature and decryption failure so
/// a forged-but-well-formed token is indistinguishable from garbage.
/// `ExpiredToken` is only returned once the token has fully verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingAuthHeader,
    InvalidAuthHeaderFormat,
    InvalidToken,
    InvalidSignature,
    ExpiredToken,
    RefreshTokenRevoked,
    Forbidden,
    InternalServer,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "missing authorization header"),
            AuthError::InvalidAuthHeaderFormat => {
                write!(f, "invalid authorization header format")
            }
            AuthError::InvalidToken => write!(f, "invalid token"),
            AuthError::InvalidSignature => write!(f, "invalid token signature"),
            AuthError::ExpiredToken => write!(f, "expired token"),
            AuthError::RefreshTokenRevoked => write!(f, "refresh token revoked"),
            AuthError::Forbidden => write!(f, "forbidden resource"),
            AuthError::InternalServer => write!(f, "internal server error"),
        }
    }
}

impl StdError for AuthError {}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// The client-facing message. Deliberately identical for every 401
    /// kind so error content can't be used as a verification oracle.
    pub fn client_message(&self) -> &'static str {
        match self.status() {
            StatusCode::FORBIDDEN => "forbidden resource",
            StatusCode::INTERNAL_SERVER_ERROR => "internal server error",
            _ => "invalid or expired credentials",
        }
    }
}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueViolation(String),
    NotFound(String),
    Unexpected(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueViolation(msg) => write!(f, "duplicate entry: {}", msg),
            DatabaseError::NotFound(msg) => write!(f, "not found: {}", msg),
            DatabaseError::Unexpected(msg) => write!(f, "database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Central error type that all application errors map to.
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Auth(AuthError),
    Database(DatabaseError),
    Email(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Email(msg) => write!(f, "email delivery failed: {}", msg),
            AppError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => {
                AppError::Database(DatabaseError::NotFound("record not found".to_string()))
            }
            // 23505: Postgres unique constraint violation
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::Database(DatabaseError::UniqueViolation(
                    "email already exists".to_string(),
                ))
            }
            _ => AppError::Database(DatabaseError::Unexpected(err.to_string())),
        }
    }
}

/// Error body returned to clients. The message is generic per status;
/// the specific kind only ever reaches the server logs.
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: u16,
}

impl AppError {
    fn log(&self) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "validation error");
            }
            AppError::Auth(e) => match e {
                AuthError::InternalServer => {
                    tracing::error!(error = %e, "auth infrastructure error");
                }
                _ => {
                    tracing::warn!(error = %e, "authentication error");
                }
            },
            AppError::Database(DatabaseError::UniqueViolation(msg)) => {
                tracing::warn!(error = %msg, "duplicate entry attempt");
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
            }
            AppError::Email(msg) => {
                tracing::error!(error = %msg, "email service error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Auth(e) => e.client_message().to_string(),
            AppError::Database(DatabaseError::UniqueViolation(msg)) => msg.clone(),
            AppError::Database(DatabaseError::NotFound(_)) => "resource not found".to_string(),
            AppError::Database(DatabaseError::Unexpected(_)) => {
                "internal server error".to_string()
            }
            AppError::Email(_) => "email service temporarily unavailable".to_string(),
            AppError::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(e) => e.status(),
            AppError::Database(e) => match e {
                DatabaseError::UniqueViolation(_) => StatusCode::CONFLICT,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Email(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.log();

        let status = self.status_code();
        HttpResponse::build(status).json(ErrorBody {
            message: self.client_message(),
            code: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::EmptyField("email".to_string());
        assert_eq!(err.to_string(), "email is empty");
    }

    #[test]
    fn all_auth_failures_share_one_unauthorized_message() {
        let kinds = [
            AuthError::MissingAuthHeader,
            AuthError::InvalidAuthHeaderFormat,
            AuthError::InvalidToken,
            AuthError::InvalidSignature,
            AuthError::ExpiredToken,
            AuthError::RefreshTokenRevoked,
        ];

        for kind in kinds {
            assert_eq!(kind.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(kind.client_message(), "invalid or expired credentials");
        }
    }

    #[test]
    fn forbidden_maps_to_403() {
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::Forbidden.client_message(), "forbidden resource");
    }

    #[test]
    fn auth_error_converts_into_app_error() {
        let app_err: AppError = AuthError::ExpiredToken.into();
        match app_err {
            AppError::Auth(AuthError::ExpiredToken) => (),
            other => panic!("expected Auth(ExpiredToken), got {:?}", other),
        }
    }

    #[test]
    fn status_codes_are_total() {
        assert_eq!(
            AppError::Validation(ValidationError::InvalidFormat("email".to_string()))
                .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(DatabaseError::UniqueViolation("email".to_string()))
                .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(DatabaseError::NotFound("user".to_string())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
