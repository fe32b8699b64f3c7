//! In-memory stores backing unit tests and local runs without Postgres.
//! Same contracts and error messages as the Postgres implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::domain::{Listing, NewListing, User};
use crate::error::{Error, Result};

use super::{ListingFilter, ListingSort, ListingStore, SortDir, SortKey, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<UserTable>,
}

#[derive(Default)]
struct UserTable {
    rows: Vec<User>,
    next_id: i64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, UserTable> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, login: &str, password_hash: &str) -> Result<User> {
        let mut table = self.lock();
        if table.rows.iter().any(|u| u.login == login) {
            return Err(Error::Conflict(
                "user with this login already exists".into(),
            ));
        }
        table.next_id += 1;
        let user = User {
            id: table.next_id,
            login: login.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        table.rows.push(user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: i64) -> Result<User> {
        self.lock()
            .rows
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound("user not found".into()))
    }

    async fn get_by_login(&self, login: &str) -> Result<User> {
        self.lock()
            .rows
            .iter()
            .find(|u| u.login == login)
            .cloned()
            .ok_or_else(|| Error::NotFound("user not found".into()))
    }
}

#[derive(Default)]
pub struct MemoryListingStore {
    inner: Mutex<ListingTable>,
}

#[derive(Default)]
struct ListingTable {
    rows: Vec<Listing>,
    next_id: i64,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ListingTable> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn filtered(&self, filter: ListingFilter) -> Vec<Listing> {
        self.lock()
            .rows
            .iter()
            .filter(|l| filter.min_price.map_or(true, |min| l.price >= min))
            .filter(|l| filter.max_price.map_or(true, |max| l.price <= max))
            .cloned()
            .collect()
    }
}

fn sort_listings(rows: &mut [Listing], sort: ListingSort) {
    rows.sort_by(|a, b| {
        let ord = match sort.key {
            SortKey::Price => a.price.cmp(&b.price),
            SortKey::Date => a.created_at.cmp(&b.created_at),
        };
        let ord = match sort.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        };
        ord.then(a.id.cmp(&b.id))
    });
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn create(&self, new: NewListing) -> Result<Listing> {
        let mut table = self.lock();
        table.next_id += 1;
        let listing = Listing {
            id: table.next_id,
            title: new.title,
            description: new.description,
            image_url: new.image_url,
            price: new.price,
            author_id: new.author_id,
            created_at: OffsetDateTime::now_utc(),
        };
        table.rows.push(listing.clone());
        Ok(listing)
    }

    async fn get_by_id(&self, id: i64) -> Result<Listing> {
        self.lock()
            .rows
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound("listing not found".into()))
    }

    async fn get_all(&self, filter: ListingFilter, sort: ListingSort) -> Result<Vec<Listing>> {
        let mut rows = self.filtered(filter);
        sort_listings(&mut rows, sort);
        Ok(rows)
    }

    async fn get_paged(
        &self,
        filter: ListingFilter,
        sort: ListingSort,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Listing>, i64)> {
        let mut rows = self.filtered(filter);
        sort_listings(&mut rows, sort);
        let total = rows.len() as i64;
        let start = (page.max(1) - 1).saturating_mul(page_size.max(0)) as usize;
        let items = rows
            .into_iter()
            .skip(start)
            .take(page_size.max(0) as usize)
            .collect();
        Ok((items, total))
    }

    async fn get_by_author(&self, author_id: i64) -> Result<Vec<Listing>> {
        let mut rows: Vec<Listing> = self
            .lock()
            .rows
            .iter()
            .filter(|l| l.author_id == author_id)
            .cloned()
            .collect();
        sort_listings(&mut rows, ListingSort::default());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_listing(price: i64, author_id: i64) -> NewListing {
        NewListing {
            title: "old bicycle".into(),
            description: "a perfectly fine bicycle".into(),
            image_url: None,
            price,
            author_id,
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = MemoryListingStore::new();
        let a = store.create(new_listing(10, 1)).await.unwrap();
        let b = store.create(new_listing(20, 1)).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn duplicate_login_is_a_conflict() {
        let store = MemoryUserStore::new();
        store.create("alice", "hash-a").await.unwrap();
        let err = store.create("alice", "hash-b").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn price_filter_bounds_are_inclusive() {
        let store = MemoryListingStore::new();
        for price in [49, 50, 150, 151] {
            store.create(new_listing(price, 1)).await.unwrap();
        }
        let filter = ListingFilter {
            min_price: Some(50),
            max_price: Some(150),
        };
        let rows = store.get_all(filter, ListingSort::default()).await.unwrap();
        let prices: Vec<i64> = rows.iter().map(|l| l.price).collect();
        assert_eq!(rows.len(), 2);
        assert!(prices.contains(&50) && prices.contains(&150));
    }

    #[tokio::test]
    async fn equal_sort_keys_fall_back_to_id_ascending() {
        let store = MemoryListingStore::new();
        for _ in 0..3 {
            store.create(new_listing(100, 1)).await.unwrap();
        }
        let sort = ListingSort {
            key: SortKey::Price,
            dir: SortDir::Desc,
        };
        let rows = store.get_all(ListingFilter::default(), sort).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn paging_past_the_end_returns_empty() {
        let store = MemoryListingStore::new();
        for price in 1..=5 {
            store.create(new_listing(price, 1)).await.unwrap();
        }
        let (items, total) = store
            .get_paged(ListingFilter::default(), ListingSort::default(), 3, 5)
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn get_by_author_only_returns_their_listings() {
        let store = MemoryListingStore::new();
        store.create(new_listing(10, 1)).await.unwrap();
        store.create(new_listing(20, 2)).await.unwrap();
        store.create(new_listing(30, 1)).await.unwrap();
        let rows = store.get_by_author(1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|l| l.author_id == 1));
    }
}
