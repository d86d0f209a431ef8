use anyhow::Result;
use artisan_core::User;
use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;

use crate::db::MarketplaceDb;
use crate::users::UserDirectory;

/// Lifetime of a login token when none is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Bearer tokens handed out at login. Each token lives for `ttl` from issue.
pub struct SessionStore {
    db: MarketplaceDb,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(db: MarketplaceDb, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Issue a fresh token for a user.
    pub async fn issue(&self, user_id: &str) -> Result<String> {
        let token = format!("token_{}", Uuid::new_v4().simple());
        let now = Utc::now();
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = now.timestamp().saturating_add(ttl_secs);

        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_id)
        .bind(now)
        .bind(expires_at)
        .execute(self.db.pool())
        .await?;

        Ok(token)
    }

    /// Resolve a token to its user. Expired and unknown tokens resolve to `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<User>> {
        let user_id: Option<(String,)> =
            sqlx::query_as("SELECT user_id FROM sessions WHERE token = ? AND expires_at > ?")
                .bind(token)
                .bind(Utc::now().timestamp())
                .fetch_optional(self.db.pool())
                .await?;

        match user_id {
            Some((user_id,)) => UserDirectory::new(self.db.clone()).get(&user_id).await,
            None => Ok(None),
        }
    }

    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete expired sessions, returning how many were removed.
    pub async fn prune_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artisan_core::NewUser;

    async fn buyer(db: &MarketplaceDb) -> User {
        UserDirectory::new(db.clone())
            .register(NewUser {
                email: "buyer@example.com".to_string(),
                name: "Test Buyer".to_string(),
                password: "TestPass123!".to_string(),
                user_type: "buyer".to_string(),
            })
            .await
            .unwrap()
    }

    async fn session_count(db: &MarketplaceDb) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(db.pool())
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_issue_resolve_revoke() {
        let db = MarketplaceDb::in_memory().await.unwrap();
        let user = buyer(&db).await;

        let sessions = SessionStore::new(db, DEFAULT_SESSION_TTL);
        let token = sessions.issue(&user.id).await.unwrap();
        assert!(token.starts_with("token_"));

        let resolved = sessions.resolve(&token).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);

        assert!(sessions.revoke(&token).await.unwrap());
        assert!(sessions.resolve(&token).await.unwrap().is_none());
        assert!(!sessions.revoke(&token).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let sessions = SessionStore::new(
            MarketplaceDb::in_memory().await.unwrap(),
            DEFAULT_SESSION_TTL,
        );
        assert!(sessions.resolve("token_bogus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_token_rejected_and_pruned() {
        let db = MarketplaceDb::in_memory().await.unwrap();
        let user = buyer(&db).await;
        let sessions = SessionStore::new(db.clone(), DEFAULT_SESSION_TTL);

        let stale = sessions.issue(&user.id).await.unwrap();
        let live = sessions.issue(&user.id).await.unwrap();

        sqlx::query("UPDATE sessions SET expires_at = ? WHERE token = ?")
            .bind(Utc::now().timestamp() - 60)
            .bind(&stale)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(sessions.resolve(&stale).await.unwrap().is_none());
        assert!(sessions.resolve(&live).await.unwrap().is_some());

        assert_eq!(sessions.prune_expired().await.unwrap(), 1);
        assert_eq!(session_count(&db).await, 1);
        assert!(sessions.resolve(&live).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let db = MarketplaceDb::in_memory().await.unwrap();
        let user = buyer(&db).await;
        let sessions = SessionStore::new(db, Duration::ZERO);

        let token = sessions.issue(&user.id).await.unwrap();
        assert!(sessions.resolve(&token).await.unwrap().is_none());
    }
}
