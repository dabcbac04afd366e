/// Users and bearer sessions
///
/// Users are created on first login from the identity provider profile and
/// refreshed on every later login. Sessions are opaque random tokens with a
/// fixed lifetime.

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::auth::IdentityProfile;
use crate::domain::{Session, User};
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the user for a provider subject, or refresh name/email/avatar
    pub async fn upsert_from_profile(&self, profile: &IdentityProfile) -> ServiceResult<User> {
        if profile.sub.trim().is_empty() {
            return Err(ServiceError::Identity("profile has no subject".into()));
        }
        let now = Utc::now();
        let email = profile.email.trim();
        let name = profile
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| (!email.is_empty()).then_some(email))
            .unwrap_or(profile.sub.as_str())
            .to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, external_id, email, name, avatar_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO UPDATE SET
                email = CASE WHEN excluded.email = '' THEN users.email ELSE excluded.email END,
                name = excluded.name,
                avatar_url = excluded.avatar_url,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&profile.sub)
        .bind(email)
        .bind(&name)
        .bind(&profile.picture)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    /// Issue a new session token for the user
    pub async fn create_session(&self, user_id: Uuid, ttl: Duration) -> ServiceResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            token: new_token(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO sessions (id, token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session.id)
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("🔑 Session created for user {}", user_id);
        Ok(session)
    }

    /// Resolve a bearer token to its user; unknown or expired tokens are unauthorized
    pub async fn resolve(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<User> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::Unauthorized)?;

        if session.is_expired(now) {
            return Err(ServiceError::Unauthorized);
        }

        self.get(session.user_id).await.map_err(|e| match e {
            ServiceError::NotFound(_) => ServiceError::Unauthorized,
            other => other,
        })
    }

    /// Logout; revoking an unknown token is a no-op
    pub async fn revoke(&self, token: &str) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete sessions that expired before `now`, returning how many were removed
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> ServiceResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Two v4 UUIDs (244 random bits), hex encoded
fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::new_token;

    #[test]
    fn tokens_are_long_and_unique() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
