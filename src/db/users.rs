//! Credential store: user identities and their password hashes.

use uuid::Uuid;

use super::{timestamp_now, CefrLevel, DbPool, StoreError, User};

/// Normalize an email for storage and lookup (trimmed, lowercased)
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct UserStore {
    pool: DbPool,
}

impl UserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new user. `password_hash` must already be hashed.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let email = normalize_email(email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(StoreError::DuplicateEmail);
        }

        let id = Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, level, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(password_hash)
        .bind(name.trim())
        .bind(CefrLevel::default().as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration for the same address
            if StoreError::is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(e)
            }
        })?;

        self.find_by_id(&id).await?.ok_or(StoreError::NotFound)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Case-insensitive lookup by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Update the mutable profile fields. `None` leaves a field unchanged.
    pub async fn update_profile(
        &self,
        id: &str,
        name: Option<&str>,
        level: Option<CefrLevel>,
    ) -> Result<User, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE(?, name),
                level = COALESCE(?, level),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name.map(str::trim))
        .bind(level.map(|l| l.as_str()))
        .bind(timestamp_now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.find_by_id(id).await?.ok_or(StoreError::NotFound)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_in_memory;

    async fn store() -> UserStore {
        UserStore::new(init_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_create_normalizes_email() {
        let users = store().await;
        let user = users
            .create(" Ada ", "  Ada@Example.COM ", "hash")
            .await
            .unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name, "Ada");
        assert_eq!(user.level, CefrLevel::A1);

        let found = users.find_by_email("ADA@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_without_mutation() {
        let users = store().await;
        users.create("Ada", "ada@example.com", "hash").await.unwrap();

        let err = users
            .create("Other", "ADA@example.com", "hash2")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(users.count().await.unwrap(), 1);

        let stored = users.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada");
        assert_eq!(stored.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_update_profile_partial() {
        let users = store().await;
        let user = users.create("Ada", "ada@example.com", "hash").await.unwrap();

        let updated = users
            .update_profile(&user.id, None, Some(CefrLevel::B2))
            .await
            .unwrap();
        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.level, CefrLevel::B2);

        let renamed = users
            .update_profile(&user.id, Some("Ada L."), None)
            .await
            .unwrap();
        assert_eq!(renamed.name, "Ada L.");
        assert_eq!(renamed.level, CefrLevel::B2);
    }

    #[tokio::test]
    async fn test_update_profile_unknown_user() {
        let users = store().await;
        let err = users
            .update_profile("missing", Some("x"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
