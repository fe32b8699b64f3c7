use async_trait::async_trait;

use crate::domain::{Listing, NewListing, User};
use crate::error::Result;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryListingStore, MemoryUserStore};
pub use postgres::{PgListingStore, PgUserStore};

/// Inclusive price bounds; `None` means unbounded on that side.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingFilter {
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Price,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

/// Sort order for listing queries. Ties are always broken by ascending id
/// so page boundaries are deterministic.
#[derive(Debug, Clone, Copy)]
pub struct ListingSort {
    pub key: SortKey,
    pub dir: SortDir,
}

impl Default for ListingSort {
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            dir: SortDir::Desc,
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with `Conflict` on a duplicate login.
    async fn create(&self, login: &str, password_hash: &str) -> Result<User>;
    async fn get_by_id(&self, id: i64) -> Result<User>;
    async fn get_by_login(&self, login: &str) -> Result<User>;
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Persist a new listing; the store assigns id and creation timestamp.
    async fn create(&self, new: NewListing) -> Result<Listing>;
    async fn get_by_id(&self, id: i64) -> Result<Listing>;
    async fn get_all(&self, filter: ListingFilter, sort: ListingSort) -> Result<Vec<Listing>>;
    /// Returns one page of matches plus the total match count.
    /// Callers pass a normalized page (>= 1) and page size (>= 1).
    async fn get_paged(
        &self,
        filter: ListingFilter,
        sort: ListingSort,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Listing>, i64)>;
    async fn get_by_author(&self, author_id: i64) -> Result<Vec<Listing>>;
}
