/// Token payload structures.
///
/// Auth tokens carry the user identity and role; email tokens carry the
/// address plus an explicit purpose tag so a password-reset token can never
/// satisfy the verify-email endpoint (or vice versa), even if both classes
/// were configured with the same secret.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(AppError::Internal(format!("unknown role: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailPurpose {
    VerifyEmail,
    ResetPassword,
}

/// Claims embedded in access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthClaims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AuthClaims {
    pub fn new(user_id: Uuid, role: Role, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            role,
            iat: now,
            exp: now + ttl_seconds,
        }
    }
}

/// Claims embedded in verify-email and forgot-password tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmailClaims {
    /// Subject (email address)
    pub sub: String,
    pub purpose: EmailPurpose,
    pub iat: i64,
    pub exp: i64,
}

impl EmailClaims {
    pub fn new(email: String, purpose: EmailPurpose, ttl_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: email,
            purpose,
            iat: now,
            exp: now + ttl_seconds,
        }
    }
}

/// Verified identity extracted from a token, attached to the request
/// context by the auth middleware for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPayload {
    pub user_id: String,
    pub role: Role,
}

impl TokenPayload {
    /// Extract the user ID as a UUID.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.user_id).map_err(|_| AppError::Auth(AuthError::InvalidToken))
    }
}

impl From<AuthClaims> for TokenPayload {
    fn from(claims: AuthClaims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = AuthClaims::new(user_id, Role::User, 900);

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""USER""#);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""ADMIN""#);
    }

    #[test]
    fn role_parses_from_str() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("SUPERUSER".parse::<Role>().is_err());
    }

    #[test]
    fn email_purpose_round_trips_through_serde() {
        let json = serde_json::to_string(&EmailPurpose::ResetPassword).unwrap();
        assert_eq!(json, r#""reset_password""#);
        let parsed: EmailPurpose = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, EmailPurpose::ResetPassword);
    }

    #[test]
    fn payload_user_id_extraction() {
        let user_id = Uuid::new_v4();
        let payload: TokenPayload = AuthClaims::new(user_id, Role::Admin, 60).into();

        assert_eq!(payload.user_id().unwrap(), user_id);
        assert_eq!(payload.role, Role::Admin);
    }

    #[test]
    fn payload_rejects_invalid_user_id() {
        let payload = TokenPayload {
            user_id: "not-a-uuid".to_string(),
            role: Role::User,
        };
        assert!(payload.user_id().is_err());
    }
}
