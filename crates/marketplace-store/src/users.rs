use anyhow::Result;
use artisan_core::{
    normalize_email, MarketplaceError, NewUser, ProfileUpdate, User, UserType,
};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::MarketplaceDb;
use crate::password::{hash_password, verify_password};

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: String,
    user_type: String,
    password_hash: String,
    bio: Option<String>,
    location: Option<String>,
    craft_type: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        let user_type = self.user_type.parse::<UserType>().map_err(|_| {
            anyhow::anyhow!("Stored user {} has unknown type '{}'", self.id, self.user_type)
        })?;

        Ok(User {
            id: self.id,
            email: self.email,
            name: self.name,
            user_type,
            bio: self.bio,
            location: self.location,
            craft_type: self.craft_type,
            created_at: self.created_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, name, user_type, password_hash, bio, location, craft_type, created_at";

/// Account registration, login checks and profile edits.
pub struct UserDirectory {
    db: MarketplaceDb,
}

impl UserDirectory {
    pub fn new(db: MarketplaceDb) -> Self {
        Self { db }
    }

    /// Register a new account. Fails with `Conflict` when the email is taken.
    pub async fn register(&self, mut input: NewUser) -> Result<User> {
        let user_type = input.validate()?;

        if self.find_row_by_email(&input.email).await?.is_some() {
            return Err(MarketplaceError::Conflict("Email already registered".to_string()).into());
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: input.email,
            name: input.name,
            user_type,
            bio: None,
            location: None,
            craft_type: None,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, user_type, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.user_type.as_str())
        .bind(hash_password(&input.password)?)
        .bind(user.created_at)
        .execute(self.db.pool())
        .await;

        match result {
            Ok(_) => {}
            // Lost a race with a concurrent registration of the same email
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(
                    MarketplaceError::Conflict("Email already registered".to_string()).into(),
                );
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("Registered {} account {}", user.user_type, user.id);

        Ok(user)
    }

    /// Verify credentials. Unknown email and wrong password are indistinguishable.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let row = self
            .find_row_by_email(&normalize_email(email))
            .await?
            .filter(|row| verify_password(password, &row.password_hash))
            .ok_or_else(|| MarketplaceError::Unauthorized("Invalid credentials".to_string()))?;

        row.into_user()
    }

    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Like `get`, but a missing user is a `NotFound` error.
    pub async fn require(&self, id: &str) -> Result<User> {
        self.get(id)
            .await?
            .ok_or_else(|| MarketplaceError::not_found("User").into())
    }

    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> Result<User> {
        update.validate()?;
        let mut user = self.require(id).await?;

        if let Some(name) = update.name {
            user.name = name.trim().to_string();
        }
        if update.bio.is_some() {
            user.bio = update.bio;
        }
        if update.location.is_some() {
            user.location = update.location;
        }
        if update.craft_type.is_some() {
            user.craft_type = update.craft_type;
        }

        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, bio = ?, location = ?, craft_type = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.bio)
        .bind(&user.location)
        .bind(&user.craft_type)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(user)
    }

    async fn find_row_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str, user_type: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Test Artisan".to_string(),
            password: "TestPass123!".to_string(),
            user_type: user_type.to_string(),
        }
    }

    async fn directory() -> UserDirectory {
        UserDirectory::new(MarketplaceDb::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let users = directory().await;
        let user = users
            .register(registration("weaver@example.com", "artisan"))
            .await
            .unwrap();

        assert_eq!(user.user_type, UserType::Artisan);
        let fetched = users.get(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "weaver@example.com");
        assert_eq!(fetched.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let users = directory().await;
        users
            .register(registration("weaver@example.com", "artisan"))
            .await
            .unwrap();

        let err = users
            .register(registration("WEAVER@example.com", "buyer"))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<MarketplaceError>(),
            Some(&MarketplaceError::Conflict("Email already registered".to_string()))
        );
    }

    #[tokio::test]
    async fn test_authenticate() {
        let users = directory().await;
        let user = users
            .register(registration("potter@example.com", "artisan"))
            .await
            .unwrap();

        let logged_in = users
            .authenticate(" Potter@Example.com", "TestPass123!")
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        let wrong = users
            .authenticate("potter@example.com", "nope-nope")
            .await
            .unwrap_err();
        assert!(matches!(
            wrong.downcast_ref::<MarketplaceError>(),
            Some(MarketplaceError::Unauthorized(_))
        ));

        let unknown = users
            .authenticate("ghost@example.com", "TestPass123!")
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_update_profile() {
        let users = directory().await;
        let user = users
            .register(registration("smith@example.com", "artisan"))
            .await
            .unwrap();

        let updated = users
            .update_profile(
                &user.id,
                ProfileUpdate {
                    bio: Some("Third-generation brass smith".to_string()),
                    craft_type: Some("Metalwork".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Test Artisan");
        assert_eq!(updated.craft_type.as_deref(), Some("Metalwork"));

        let fetched = users.require(&user.id).await.unwrap();
        assert_eq!(fetched.bio.as_deref(), Some("Third-generation brass smith"));
    }

    #[tokio::test]
    async fn test_require_missing_user() {
        let users = directory().await;
        let err = users.require("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }
}
