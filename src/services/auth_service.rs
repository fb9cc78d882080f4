use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{LoginPayload, RegisterPayload};
use crate::error::{Error, Result};
use crate::models::user::{RefreshToken, User};
use crate::utils::crypto::{hash_password, sha256_hex, verify_password};
use crate::utils::time::{days_from_now, now};
use crate::utils::token::{generate_refresh_token, issue_access_token, REFRESH_TOKEN_LENGTH};

const USER_COLUMNS: &str = "id, email, password_hash, full_name, created_at, updated_at";
const BAD_CREDENTIALS: &str = "Invalid email or password";
const BAD_REFRESH: &str = "Refresh token is invalid or expired";

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_secret: String,
    access_ttl_minutes: i64,
    refresh_ttl_days: i64,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        jwt_secret: String,
        access_ttl_minutes: i64,
        refresh_ttl_days: i64,
    ) -> Self {
        Self {
            pool,
            jwt_secret,
            access_ttl_minutes,
            refresh_ttl_days,
        }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<(User, IssuedTokens)> {
        payload.validate()?;
        let email = normalize_email(&payload.email);
        let full_name = crate::utils::validation::required_text("full_name", &payload.full_name)?;
        let password_hash = hash_password(&payload.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, full_name)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(&full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => {
                Error::Conflict("An account with this email already exists".to_string())
            }
            other => other,
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        let tokens = self.issue_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Unknown email and wrong password are reported identically.
    pub async fn login(&self, payload: LoginPayload) -> Result<(User, IssuedTokens)> {
        payload.validate()?;
        let user = self
            .find_by_email(&normalize_email(&payload.email))
            .await?
            .ok_or_else(|| Error::Unauthorized(BAD_CREDENTIALS.to_string()))?;

        if !verify_password(&payload.password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "login rejected");
            return Err(Error::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        let tokens = self.issue_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Exchanges a live refresh token for a new pair. The presented token
    /// is revoked so it can only be used once.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, IssuedTokens)> {
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, expires_at, revoked_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            FOR UPDATE
            "#,
        )
        .bind(sha256_hex(refresh_token.trim()))
        .fetch_optional(&mut *tx)
        .await?
        .filter(|t| t.is_usable(now()))
        .ok_or_else(|| Error::Unauthorized(BAD_REFRESH.to_string()))?;

        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE id = $1")
            .bind(stored.id)
            .execute(&mut *tx)
            .await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(stored.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::Unauthorized(BAD_REFRESH.to_string()))?;

        let tokens = self.issue_tokens_on(&mut tx, &user).await?;
        tx.commit().await?;
        Ok((user, tokens))
    }

    /// Revokes the given refresh token. Unknown or already revoked tokens
    /// are ignored.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(sha256_hex(refresh_token.trim()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("User"))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn issue_tokens(&self, user: &User) -> Result<IssuedTokens> {
        let mut tx = self.pool.begin().await?;
        let tokens = self.issue_tokens_on(&mut tx, user).await?;
        tx.commit().await?;
        Ok(tokens)
    }

    async fn issue_tokens_on(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user: &User,
    ) -> Result<IssuedTokens> {
        let (access_token, access_token_expires_at) = issue_access_token(
            user.id,
            &user.email,
            &self.jwt_secret,
            self.access_ttl_minutes,
        )?;

        let refresh_token = generate_refresh_token(REFRESH_TOKEN_LENGTH);
        let refresh_token_expires_at = days_from_now(self.refresh_ttl_days);
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user.id)
        .bind(sha256_hex(&refresh_token))
        .bind(refresh_token_expires_at)
        .execute(&mut **tx)
        .await?;

        Ok(IssuedTokens {
            access_token,
            access_token_expires_at,
            refresh_token,
            refresh_token_expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_compared_case_insensitively() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
