use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::User;
use crate::db::{classify, StoreError};

const USER_CONSTRAINTS: &[(&str, &str)] = &[
    ("users_email_key", "email"),
    ("users_username_key", "username"),
];

/// Credential store.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    /// Insert a user; a taken email or username yields [`StoreError::Duplicate`].
    async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, email, username, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, username, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, USER_CONSTRAINTS))
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use time::OffsetDateTime;

    use super::*;

    /// In-process user store with the same uniqueness rules as the table.
    #[derive(Default)]
    pub struct MemoryUserStore {
        rows: Mutex<Vec<User>>,
    }

    impl MemoryUserStore {
        pub fn count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|u| u.username == username).cloned())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|u| u.id == id).cloned())
        }

        async fn create(
            &self,
            email: &str,
            username: &str,
            password_hash: &str,
        ) -> Result<User, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|u| u.email == email) {
                return Err(StoreError::Duplicate("email"));
            }
            if rows.iter().any(|u| u.username == username) {
                return Err(StoreError::Duplicate("username"));
            }
            let user = User {
                id: rows.iter().map(|u| u.id).max().unwrap_or(0) + 1,
                email: email.to_string(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: OffsetDateTime::now_utc(),
            };
            rows.push(user.clone());
            Ok(user)
        }
    }
}
