/// Token issuance and validation.
///
/// One `TokenService` instance holds the keys and lifetimes for all four
/// token classes (access, refresh, verify-email, reset-password). It is
/// immutable after construction and passed explicitly into the middleware
/// and handlers, so tests can run with distinct secrets per case.
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::auth::claims::{AuthClaims, EmailClaims, EmailPurpose, Role, TokenPayload};
use crate::configuration::{TokenClassSettings, TokenSettings};
use crate::error::AuthError;

const MIN_SECRET_LENGTH: usize = 32;

#[derive(Clone)]
struct TokenClass {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl TokenClass {
    fn new(settings: &TokenClassSettings, name: &str) -> Result<Self, config::ConfigError> {
        if settings.secret.len() < MIN_SECRET_LENGTH {
            return Err(config::ConfigError::Message(format!(
                "{} token secret must be at least {} bytes",
                name, MIN_SECRET_LENGTH
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding: DecodingKey::from_secret(settings.secret.as_bytes()),
            ttl_seconds: settings.ttl_seconds,
        })
    }
}

#[derive(Clone)]
pub struct TokenService {
    access: TokenClass,
    refresh: TokenClass,
    verify_email: TokenClass,
    reset_password: TokenClass,
}

impl TokenService {
    pub fn from_settings(settings: &TokenSettings) -> Result<Self, config::ConfigError> {
        Ok(Self {
            access: TokenClass::new(&settings.access, "access")?,
            refresh: TokenClass::new(&settings.refresh, "refresh")?,
            verify_email: TokenClass::new(&settings.verify_email, "verify_email")?,
            reset_password: TokenClass::new(&settings.reset_password, "reset_password")?,
        })
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access.ttl_seconds
    }

    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh.ttl_seconds
    }

    pub fn issue_access_token(&self, user_id: Uuid, role: Role) -> Result<String, AuthError> {
        let claims = AuthClaims::new(user_id, role, self.access.ttl_seconds);
        encode_claims(&self.access, &claims)
    }

    /// Mints a refresh token. The caller is responsible for persisting it
    /// through the refresh-token store; the service itself holds no state.
    pub fn issue_refresh_token(&self, user_id: Uuid, role: Role) -> Result<String, AuthError> {
        let claims = AuthClaims::new(user_id, role, self.refresh.ttl_seconds);
        encode_claims(&self.refresh, &claims)
    }

    pub fn issue_email_token(
        &self,
        email: &str,
        purpose: EmailPurpose,
    ) -> Result<String, AuthError> {
        let class = self.email_class(purpose);
        let claims = EmailClaims::new(email.to_string(), purpose, class.ttl_seconds);
        encode_claims(class, &claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<TokenPayload, AuthError> {
        let claims: AuthClaims = decode_claims(&self.access, token)?;
        Ok(claims.into())
    }

    /// Cryptographic validation only. Server-side liveness of the refresh
    /// token (logout, rotation) is the store's concern and is checked by
    /// the refresh-exchange handler.
    pub fn validate_refresh_token(&self, token: &str) -> Result<TokenPayload, AuthError> {
        let claims: AuthClaims = decode_claims(&self.refresh, token)?;
        Ok(claims.into())
    }

    /// Validates an email token and returns the embedded address. The
    /// expected purpose must match the one pinned in the claims.
    pub fn validate_email_token(
        &self,
        token: &str,
        purpose: EmailPurpose,
    ) -> Result<String, AuthError> {
        let claims: EmailClaims = decode_claims(self.email_class(purpose), token)?;
        if claims.purpose != purpose {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims.sub)
    }

    fn email_class(&self, purpose: EmailPurpose) -> &TokenClass {
        match purpose {
            EmailPurpose::VerifyEmail => &self.verify_email,
            EmailPurpose::ResetPassword => &self.reset_password,
        }
    }
}

fn encode_claims<T: Serialize>(class: &TokenClass, claims: &T) -> Result<String, AuthError> {
    encode(&Header::default(), claims, &class.encoding).map_err(|e| {
        tracing::error!(error = %e, "token encoding failed");
        AuthError::InternalServer
    })
}

/// Integrity is verified before any claims check; expiry is only reported
/// once the signature has validated, and every other failure collapses to
/// `InvalidToken` so the error itself leaks nothing about why.
fn decode_claims<T: DeserializeOwned>(class: &TokenClass, token: &str) -> Result<T, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<T>(token, &class.decoding, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            _ => AuthError::InvalidToken,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::TokenClassSettings;

    fn class(secret: &str, ttl_seconds: i64) -> TokenClassSettings {
        TokenClassSettings {
            secret: secret.to_string(),
            ttl_seconds,
        }
    }

    fn test_settings() -> TokenSettings {
        TokenSettings {
            access: class("access-secret-for-tests-0123456789ab", 900),
            refresh: class("refresh-secret-for-tests-0123456789a", 2_592_000),
            verify_email: class("verify-email-secret-for-tests-01234a", 86_400),
            reset_password: class("reset-password-secret-for-tests-0123", 900),
        }
    }

    fn test_service() -> TokenService {
        TokenService::from_settings(&test_settings()).expect("failed to build token service")
    }

    #[test]
    fn rejects_short_secrets() {
        let mut settings = test_settings();
        settings.access = class("too-short", 900);
        assert!(TokenService::from_settings(&settings).is_err());
    }

    #[test]
    fn access_token_round_trip() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service
            .issue_access_token(user_id, Role::User)
            .expect("failed to issue token");
        let payload = service
            .validate_access_token(&token)
            .expect("failed to validate token");

        assert_eq!(payload.user_id, user_id.to_string());
        assert_eq!(payload.role, Role::User);
    }

    #[test]
    fn refresh_token_round_trip() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service
            .issue_refresh_token(user_id, Role::Admin)
            .expect("failed to issue token");
        let payload = service
            .validate_refresh_token(&token)
            .expect("failed to validate token");

        assert_eq!(payload.user_id, user_id.to_string());
        assert_eq!(payload.role, Role::Admin);
    }

    #[test]
    fn email_token_round_trip() {
        let service = test_service();

        let token = service
            .issue_email_token("user@example.com", EmailPurpose::VerifyEmail)
            .expect("failed to issue token");
        let email = service
            .validate_email_token(&token, EmailPurpose::VerifyEmail)
            .expect("failed to validate token");

        assert_eq!(email, "user@example.com");
    }

    #[test]
    fn expired_token_yields_expired_not_invalid() {
        let mut settings = test_settings();
        settings.access.ttl_seconds = -1;
        let service = TokenService::from_settings(&settings).unwrap();

        let token = service
            .issue_access_token(Uuid::new_v4(), Role::User)
            .unwrap();

        assert_eq!(
            service.validate_access_token(&token),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn token_validated_against_different_secret_is_rejected() {
        let issuer = test_service();

        let mut other_settings = test_settings();
        other_settings.access = class("a-completely-different-secret-012345", 900);
        let verifier = TokenService::from_settings(&other_settings).unwrap();

        let token = issuer
            .issue_access_token(Uuid::new_v4(), Role::User)
            .unwrap();

        assert_eq!(
            verifier.validate_access_token(&token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn expired_forgery_is_rejected_as_invalid_before_expiry_is_reported() {
        // A forged token that also happens to be expired must fail on the
        // signature, never reach the expiry check.
        let mut settings = test_settings();
        settings.access.ttl_seconds = -1;
        let issuer = TokenService::from_settings(&settings).unwrap();

        let mut other_settings = test_settings();
        other_settings.access = class("a-completely-different-secret-012345", -1);
        let verifier = TokenService::from_settings(&other_settings).unwrap();

        let token = issuer
            .issue_access_token(Uuid::new_v4(), Role::User)
            .unwrap();

        assert_eq!(
            verifier.validate_access_token(&token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_token_is_invalid() {
        let service = test_service();
        let token = service
            .issue_access_token(Uuid::new_v4(), Role::User)
            .unwrap();

        let tampered = format!("{}x", token);
        let result = service.validate_access_token(&tampered);

        assert!(matches!(
            result,
            Err(AuthError::InvalidToken) | Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let service = test_service();
        assert_eq!(
            service.validate_access_token("not.a.token"),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn refresh_token_does_not_validate_as_access_token() {
        let service = test_service();
        let token = service
            .issue_refresh_token(Uuid::new_v4(), Role::User)
            .unwrap();

        assert_eq!(
            service.validate_access_token(&token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn email_token_purpose_mismatch_is_rejected() {
        // Even with both email classes sharing a secret, the purpose tag
        // pinned in the claims blocks cross-endpoint replay.
        let mut settings = test_settings();
        let shared = class("shared-email-secret-for-tests-012345", 900);
        settings.verify_email = shared.clone();
        settings.reset_password = shared;
        let service = TokenService::from_settings(&settings).unwrap();

        let token = service
            .issue_email_token("user@example.com", EmailPurpose::ResetPassword)
            .unwrap();

        assert_eq!(
            service.validate_email_token(&token, EmailPurpose::VerifyEmail),
            Err(AuthError::InvalidToken)
        );
    }
}
