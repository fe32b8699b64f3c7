use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record as persisted. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The part of a user that may leave the process: id and login only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub login: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            login: user.login,
        }
    }
}

/// Listing record as persisted. Immutable after creation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: i64,
    pub author_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Listing fields supplied by the caller; id and created_at are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: i64,
    pub author_id: i64,
}
