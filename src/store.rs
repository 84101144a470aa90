/// Credential Store
///
/// SQLite-backed `users` table. Username uniqueness is enforced by the
/// table's UNIQUE constraint, not by a read-before-write check.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{AppError, DatabaseError};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Insert a user and return its new id.
    ///
    /// # Errors
    /// `DatabaseError::UniqueConstraintViolation` when the username is taken.
    pub async fn create(&self, username: &str, password_hash: &str) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find(&self, username: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::Database(DatabaseError::NotFound(format!("user '{}'", username)))
        })
    }

    pub async fn find_by_id(&self, id: i64) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Database(DatabaseError::NotFound(format!("user id {}", id))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::{get_connection_pool, Settings};

    async fn test_store() -> UserStore {
        let pool = get_connection_pool(&Settings::for_tests())
            .await
            .expect("Failed to open in-memory database");
        let store = UserStore::new(pool);
        store.migrate().await.expect("Failed to migrate");
        store
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = test_store().await;

        let id = store.create("alice", "hash-a").await.unwrap();
        let user = store.find("alice").await.unwrap();

        assert_eq!(user.id, id);
        assert_eq!(user.username, "alice");
        assert_eq!(user.password_hash, "hash-a");
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let store = test_store().await;

        let id = store.create("alice", "hash-a").await.unwrap();
        let user = store.find_by_id(id).await.unwrap();

        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = test_store().await;

        let a = store.create("alice", "hash-a").await.unwrap();
        let b = store.create("bob", "hash-b").await.unwrap();

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let store = test_store().await;
        store.create("alice", "hash-a").await.unwrap();

        match store.create("alice", "hash-b").await {
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_))) => (),
            other => panic!("Expected UniqueConstraintViolation, got {:?}", other),
        }

        let user = store.find("alice").await.unwrap();
        assert_eq!(user.password_hash, "hash-a");
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let store = test_store().await;

        assert!(matches!(
            store.find("nobody").await,
            Err(AppError::Database(DatabaseError::NotFound(_)))
        ));
        assert!(matches!(
            store.find_by_id(999).await,
            Err(AppError::Database(DatabaseError::NotFound(_)))
        ));
    }
}
