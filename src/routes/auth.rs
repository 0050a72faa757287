/// Authentication routes: signup, login, refresh-token exchange, logout.
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::cookie::{
    access_token_cookie, refresh_token_cookie, removal_cookie, ACCESS_COOKIE_PATH,
    ACCESS_TOKEN_COOKIE, REFRESH_COOKIE_PATH, REFRESH_TOKEN_COOKIE,
};
use crate::auth::{
    hash_password, verify_password, EmailPurpose, RefreshTokenRecord, RefreshTokenStore, Role,
    TokenService,
};
use crate::configuration::CookieSettings;
use crate::email_client::EmailClient;
use crate::error::{AppError, AuthError, ValidationError};
use crate::validators::{is_valid_email, is_valid_full_name};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The refresh token only ever travels in its HTTP-only cookie; the body
/// carries the access token for clients that prefer the header scheme.
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
}

/// POST /auth/signup
///
/// Creates the user, issues both tokens, persists the refresh token and
/// kicks off a verification email. 409 when the email is already taken.
pub async fn signup(
    form: web::Json<SignupRequest>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    store: web::Data<dyn RefreshTokenStore>,
    email_client: web::Data<EmailClient>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let full_name = is_valid_full_name(&form.full_name)?;
    let password_hash = hash_password(&form.password)?;

    let user_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, full_name, email, password_hash, role, email_verified, created_at)
        VALUES ($1, $2, $3, $4, $5, FALSE, $6)
        "#,
    )
    .bind(user_id)
    .bind(&full_name)
    .bind(&email)
    .bind(&password_hash)
    .bind(Role::User.as_str())
    .bind(Utc::now())
    .execute(pool.get_ref())
    .await?;

    let (access_token, refresh_cookie) =
        issue_session(user_id, Role::User, &tokens, &store, &cookies).await?;

    send_verification_email(&tokens, &email_client, email);

    tracing::info!(user_id = %user_id, "user signed up");

    Ok(HttpResponse::Created()
        .cookie(access_token_cookie(
            &access_token,
            tokens.access_ttl_seconds(),
            cookies.secure,
        ))
        .cookie(refresh_cookie)
        .json(AuthResponse { access_token }))
}

/// POST /auth/login
///
/// The same failure is returned whether the email is unknown or the
/// password is wrong, to prevent user enumeration. A successful login
/// replaces any previously stored refresh token for the user.
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    store: web::Data<dyn RefreshTokenStore>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let user = sqlx::query_as::<_, (Uuid, String, String)>(
        "SELECT id, password_hash, role FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(invalid_credentials)?;

    let (user_id, password_hash, role) = user;

    if !verify_password(&form.password, &password_hash)? {
        return Err(invalid_credentials());
    }

    let role: Role = role.parse()?;
    let (access_token, refresh_cookie) =
        issue_session(user_id, role, &tokens, &store, &cookies).await?;

    tracing::info!(user_id = %user_id, "user logged in");

    Ok(HttpResponse::Ok()
        .cookie(access_token_cookie(
            &access_token,
            tokens.access_ttl_seconds(),
            cookies.secure,
        ))
        .cookie(refresh_cookie)
        .json(AuthResponse { access_token }))
}

/// POST /auth/refresh
///
/// Exchanges the refresh-token cookie for a fresh access token. The token
/// must verify cryptographically AND still exist server-side: a logout or
/// a later login deletes/replaces the row, revoking it before its natural
/// expiry. The stored row is not rotated here.
pub async fn refresh(
    req: HttpRequest,
    tokens: web::Data<TokenService>,
    store: web::Data<dyn RefreshTokenStore>,
    cookies: web::Data<CookieSettings>,
) -> Result<HttpResponse, AppError> {
    let cookie = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .ok_or(AuthError::InvalidToken)?;

    let payload = tokens.validate_refresh_token(cookie.value())?;

    if !store.exists(cookie.value()).await? {
        return Err(AuthError::RefreshTokenRevoked.into());
    }

    let user_id = payload.user_id()?;
    let access_token = tokens.issue_access_token(user_id, payload.role)?;

    tracing::info!(user_id = %user_id, "access token refreshed");

    Ok(HttpResponse::Ok()
        .cookie(access_token_cookie(
            &access_token,
            tokens.access_ttl_seconds(),
            cookies.secure,
        ))
        .json(AuthResponse { access_token }))
}

/// POST /auth/logout
///
/// Deletes the stored refresh token (idempotently) and clears both
/// cookies. Outstanding access tokens keep working until natural expiry.
pub async fn logout(
    req: HttpRequest,
    store: web::Data<dyn RefreshTokenStore>,
) -> Result<HttpResponse, AppError> {
    let cookie = req.cookie(REFRESH_TOKEN_COOKIE).ok_or_else(|| {
        AppError::Validation(ValidationError::EmptyField("refresh token".to_string()))
    })?;

    store.delete(cookie.value()).await?;

    Ok(HttpResponse::NoContent()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE, ACCESS_COOKIE_PATH))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE, REFRESH_COOKIE_PATH))
        .finish())
}

/// Issues the access/refresh pair and upserts the refresh token, replacing
/// any prior session row for the user. Returns the access token and the
/// refresh cookie.
async fn issue_session(
    user_id: Uuid,
    role: Role,
    tokens: &TokenService,
    store: &web::Data<dyn RefreshTokenStore>,
    cookies: &CookieSettings,
) -> Result<(String, actix_web::cookie::Cookie<'static>), AppError> {
    let access_token = tokens.issue_access_token(user_id, role)?;
    let refresh_token = tokens.issue_refresh_token(user_id, role)?;

    store
        .upsert(&RefreshTokenRecord::new(
            user_id,
            refresh_token.clone(),
            tokens.refresh_ttl_seconds(),
        ))
        .await?;

    let refresh_cookie =
        refresh_token_cookie(&refresh_token, tokens.refresh_ttl_seconds(), cookies.secure);

    Ok((access_token, refresh_cookie))
}

fn invalid_credentials() -> AppError {
    AppError::Validation(ValidationError::InvalidFormat(
        "email or password".to_string(),
    ))
}

fn send_verification_email(tokens: &TokenService, email_client: &EmailClient, email: String) {
    let token = match tokens.issue_email_token(&email, EmailPurpose::VerifyEmail) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to issue email verification token");
            return;
        }
    };

    let client = email_client.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = client.send_verification_email(&email, &token).await {
            tracing::error!(error = %e, "failed to send verification email");
        }
    });
}
