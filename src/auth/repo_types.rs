use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database. Never serialized directly; see `PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String, // bcrypt, stays server-side
    pub created_at: OffsetDateTime,
}
