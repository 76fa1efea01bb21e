use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,                            // assigned by the database
    pub full_name: String,
    pub phone: String,                      // unique among active users
    #[serde(skip_serializing)]
    pub password_hash: String,              // Argon2 PHC string, not exposed in JSON
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>, // soft-delete marker
}

/// Fields needed to insert a user; the ID comes back from the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub phone: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One successful login.
#[derive(Debug, Clone, FromRow)]
pub struct UserAttendance {
    pub user_id: i64,
    pub login_at: OffsetDateTime,
}
