/// Refresh token persistence.
///
/// A refresh token is stateless on the wire but tied to a server-side row
/// so it can be revoked. The store keeps at most one live row per user:
/// logging in again replaces the previous row, which silently invalidates
/// the earlier session's refresh capability.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn new(user_id: Uuid, token: String, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at: now + Duration::seconds(ttl_seconds),
            created_at: now,
        }
    }
}

/// Server-side revocation point for refresh tokens.
///
/// `exists` returning `false` is the only not-found signal; persistence
/// failures surface as `AppError::Database` and the caller never gets to
/// distinguish "absent" from "broken" any other way.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Inserts the row, or replaces the existing row for the same user.
    async fn upsert(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;

    async fn exists(&self, token: &str) -> Result<bool, AppError>;

    /// Deleting an absent token is not an error.
    async fn delete(&self, token: &str) -> Result<(), AppError>;
}

pub struct PostgresRefreshTokenStore {
    pool: PgPool,
}

impl PostgresRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PostgresRefreshTokenStore {
    async fn upsert(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET token = EXCLUDED.token,
                expires_at = EXCLUDED.expires_at,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.token)
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn exists(&self, token: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM refresh_tokens WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// In-process store used by tests in place of the Postgres-backed one.
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    rows: Mutex<HashMap<Uuid, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn upsert(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        rows.insert(record.user_id, record.clone());
        Ok(())
    }

    async fn exists(&self, token: &str) -> Result<bool, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().any(|r| r.token == token))
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|_, r| r.token != token);
        Ok(())
    }
}
