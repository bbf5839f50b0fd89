//! Database repository for issued API tokens.

use crate::database::models::ApiToken;
use anyhow::Result;
use chrono::{Duration, Utc};
use sqlx::PgPool;

/// Access token lifetime: one hour.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;
/// Refresh token lifetime: thirty days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 2_592_000;

/// Repository for token database operations.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Issues a new token pair for an organizer. Any previously active
    /// tokens for the organizer are deactivated first, so exactly one pair
    /// is live at a time.
    pub async fn create_token(
        &self,
        organizer_id: i64,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<ApiToken> {
        self.deactivate_organizer_tokens(organizer_id).await?;

        let now = Utc::now();
        let expires_at = now + Duration::seconds(ACCESS_TOKEN_TTL_SECS);
        let refresh_expires_at = now + Duration::seconds(REFRESH_TOKEN_TTL_SECS);

        let token = sqlx::query_as::<_, ApiToken>(
            r#"
            INSERT INTO api_tokens
            (organizer_id, access_token, refresh_token, expires_at, refresh_expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(organizer_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(expires_at)
        .bind(refresh_expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(token)
    }

    /// Looks up an active, unexpired access token and touches its
    /// `last_used_at` timestamp.
    pub async fn find_by_access_token(&self, access_token: &str) -> Result<Option<ApiToken>> {
        let token = sqlx::query_as::<_, ApiToken>(
            "SELECT * FROM api_tokens \
             WHERE access_token = $1 AND is_active = TRUE AND expires_at > NOW()",
        )
        .bind(access_token)
        .fetch_optional(self.pool)
        .await?;

        if let Some(token) = &token {
            sqlx::query("UPDATE api_tokens SET last_used_at = NOW() WHERE id = $1")
                .bind(token.id)
                .execute(self.pool)
                .await?;
        }

        Ok(token)
    }

    /// Looks up an active token pair by its refresh token.
    pub async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<ApiToken>> {
        let token = sqlx::query_as::<_, ApiToken>(
            "SELECT * FROM api_tokens \
             WHERE refresh_token = $1 AND is_active = TRUE AND refresh_expires_at > NOW()",
        )
        .bind(refresh_token)
        .fetch_optional(self.pool)
        .await?;

        Ok(token)
    }

    /// Deactivates every active token belonging to an organizer.
    pub async fn deactivate_organizer_tokens(&self, organizer_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE api_tokens SET is_active = FALSE, updated_at = NOW() \
             WHERE organizer_id = $1 AND is_active = TRUE",
        )
        .bind(organizer_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Deactivates a single token by its access token value.
    pub async fn deactivate_token(&self, access_token: &str) -> Result<()> {
        sqlx::query(
            "UPDATE api_tokens SET is_active = FALSE, updated_at = NOW() \
             WHERE access_token = $1",
        )
        .bind(access_token)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Deactivates tokens whose access or refresh lifetime has lapsed.
    /// Returns the number of tokens affected.
    pub async fn cleanup_expired_tokens(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE api_tokens SET is_active = FALSE, updated_at = NOW() \
             WHERE (expires_at < NOW() OR refresh_expires_at < NOW()) AND is_active = TRUE",
        )
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
