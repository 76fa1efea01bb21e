use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, User, UserAttendance};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another active user already holds the phone number.
    #[error("phone number already taken")]
    PhoneTaken,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::PhoneTaken;
            }
        }
        StoreError::Backend(e.into())
    }
}

/// Persistence for users and login attendance.
///
/// Lookups only return active (not soft-deleted) users.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<i64, StoreError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn update(&self, user: &User) -> Result<(), StoreError>;
    async fn record_login(&self, attendance: &UserAttendance) -> Result<(), StoreError>;
    /// Inserts the summary row at 1 or increments it.
    async fn increment_login_summary(&self, user_id: i64) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgIdentityStore {
    db: PgPool,
}

impl PgIdentityStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create(&self, user: &NewUser) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (full_name, phone, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.db)
        .await?;
        Ok(id)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, phone, password_hash, created_at, updated_at, deleted_at
            FROM users
            WHERE phone = $1 AND deleted_at IS NULL
            LIMIT 1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, phone, password_hash, created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET full_name = $2, phone = $3, updated_at = $4, deleted_at = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.updated_at)
        .bind(user.deleted_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn record_login(&self, attendance: &UserAttendance) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_attendance_logs (user_id, login_at)
            VALUES ($1, $2)
            "#,
        )
        .bind(attendance.user_id)
        .bind(attendance.login_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn increment_login_summary(&self, user_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO user_attendance_summaries (user_id, total_login)
            VALUES ($1, 1)
            ON CONFLICT (user_id)
            DO UPDATE SET total_login = user_attendance_summaries.total_login + 1
            "#,
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_backend_failures() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
