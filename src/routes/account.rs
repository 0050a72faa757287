/// Account routes: forgot/reset password, email verification, current
/// user and the admin user listing.
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{hash_password, EmailPurpose, TokenPayload, TokenService};
use crate::email_client::EmailClient;
use crate::error::{AppError, DatabaseError};
use crate::validators::is_valid_email;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub email_verified: bool,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

/// POST /account/forgot-password
///
/// Always answers 204, whether or not the address is registered, so the
/// endpoint can't be used to probe for accounts. The reset email is sent
/// fire-and-forget.
pub async fn forgot_password(
    form: web::Json<ForgotPasswordRequest>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_one(pool.get_ref())
            .await?;

    if !exists {
        return Ok(HttpResponse::NoContent().finish());
    }

    let token = tokens.issue_email_token(&email, EmailPurpose::ResetPassword)?;

    let client = email_client.get_ref().clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = client.send_password_reset_email(&email, &token).await {
            tracing::error!(error = %e, "failed to send password reset email");
        }
    });

    Ok(HttpResponse::NoContent().finish())
}

/// POST /account/reset-password
///
/// The token must validate with the reset-password purpose; a
/// verify-email token presented here is rejected outright.
pub async fn reset_password(
    form: web::Json<ResetPasswordRequest>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let email = tokens.validate_email_token(&form.token, EmailPurpose::ResetPassword)?;
    let password_hash = hash_password(&form.password)?;

    let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE email = $2")
        .bind(&password_hash)
        .bind(&email)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("user not found".to_string()).into());
    }

    tracing::info!(email = %email, "password reset");

    Ok(HttpResponse::NoContent().finish())
}

/// GET /account/verify-email?token=...
pub async fn verify_email(
    query: web::Query<VerifyEmailQuery>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let email = tokens.validate_email_token(&query.token, EmailPurpose::VerifyEmail)?;

    let result = sqlx::query("UPDATE users SET email_verified = TRUE WHERE email = $1")
        .bind(&email)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound("user not found".to_string()).into());
    }

    tracing::info!(email = %email, "email verified");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "email verified"
    })))
}

/// GET /api/session
///
/// Echoes the verified identity of the presented access token without
/// touching the store.
pub async fn session(payload: web::ReqData<TokenPayload>) -> HttpResponse {
    HttpResponse::Ok().json(payload.into_inner())
}

/// GET /api/me
///
/// Requires a valid access token; the identity comes from the payload the
/// auth middleware injected.
pub async fn me(
    payload: web::ReqData<TokenPayload>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let user_id = payload.user_id()?;

    let user = sqlx::query_as::<_, (Uuid, String, String, String, bool, DateTime<Utc>)>(
        "SELECT id, full_name, email, role, email_verified, created_at FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or_else(|| DatabaseError::NotFound("user not found".to_string()))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.0.to_string(),
        full_name: user.1,
        email: user.2,
        role: user.3,
        email_verified: user.4,
        created_at: user.5.to_rfc3339(),
    }))
}

/// GET /api/admin/users
///
/// Admin-gated flat listing.
pub async fn list_users(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let users = sqlx::query_as::<_, (Uuid, String, String, String)>(
        "SELECT id, full_name, email, role FROM users ORDER BY created_at DESC LIMIT 100",
    )
    .fetch_all(pool.get_ref())
    .await?;

    let users: Vec<UserSummary> = users
        .into_iter()
        .map(|(id, full_name, email, role)| UserSummary {
            id: id.to_string(),
            full_name,
            email,
            role,
        })
        .collect();

    Ok(HttpResponse::Ok().json(users))
}
