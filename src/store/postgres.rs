use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Listing, NewListing, User};
use crate::error::{Error, Result};

use super::{ListingFilter, ListingSort, ListingStore, SortDir, SortKey, UserStore};

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
    async fn create(&self, login: &str, password_hash: &str) -> Result<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, password_hash)
            VALUES ($1, $2)
            RETURNING id, login, password_hash, created_at
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            // Concurrent registrations race on the unique index; the loser
            // surfaces as a conflict, same as the pre-check.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(Error::Conflict(
                "user with this login already exists".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::NotFound("user not found".into()))
    }

    async fn get_by_login(&self, login: &str) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, password_hash, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::NotFound("user not found".into()))
    }
}

#[derive(Clone)]
pub struct PgListingStore {
    db: PgPool,
}

impl PgListingStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const LISTING_COLUMNS: &str = "id, title, description, image_url, price, author_id, created_at";

// Optional bounds are pushed down as `($n IS NULL OR ...)` so one static
// WHERE clause covers every filter combination.
const PRICE_WHERE: &str =
    "($1::BIGINT IS NULL OR price >= $1) AND ($2::BIGINT IS NULL OR price <= $2)";

fn order_clause(sort: ListingSort) -> &'static str {
    match (sort.key, sort.dir) {
        (SortKey::Price, SortDir::Asc) => "price ASC, id ASC",
        (SortKey::Price, SortDir::Desc) => "price DESC, id ASC",
        (SortKey::Date, SortDir::Asc) => "created_at ASC, id ASC",
        (SortKey::Date, SortDir::Desc) => "created_at DESC, id ASC",
    }
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn create(&self, new: NewListing) -> Result<Listing> {
        let listing = sqlx::query_as::<_, Listing>(
            r#"
            INSERT INTO listings (title, description, image_url, price, author_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, image_url, price, author_id, created_at
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.image_url)
        .bind(new.price)
        .bind(new.author_id)
        .fetch_one(&self.db)
        .await?;
        Ok(listing)
    }

    async fn get_by_id(&self, id: i64) -> Result<Listing> {
        sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| Error::NotFound("listing not found".into()))
    }

    async fn get_all(&self, filter: ListingFilter, sort: ListingSort) -> Result<Vec<Listing>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE {PRICE_WHERE} ORDER BY {}",
            order_clause(sort)
        );
        let rows = sqlx::query_as::<_, Listing>(&sql)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn get_paged(
        &self,
        filter: ListingFilter,
        sort: ListingSort,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Listing>, i64)> {
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM listings WHERE {PRICE_WHERE}"))
                .bind(filter.min_price)
                .bind(filter.max_price)
                .fetch_one(&self.db)
                .await?;

        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings WHERE {PRICE_WHERE} \
             ORDER BY {} LIMIT $3 OFFSET $4",
            order_clause(sort)
        );
        let rows = sqlx::query_as::<_, Listing>(&sql)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .bind(page_size)
            .bind((page - 1) * page_size)
            .fetch_all(&self.db)
            .await?;

        Ok((rows, total))
    }

    async fn get_by_author(&self, author_id: i64) -> Result<Vec<Listing>> {
        let rows = sqlx::query_as::<_, Listing>(&format!(
            "SELECT {LISTING_COLUMNS} FROM listings \
             WHERE author_id = $1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(author_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
