use std::sync::Arc;

use crate::domain::NewListing;
use crate::error::{Error, Result};
use crate::store::{ListingFilter, ListingSort, ListingStore, SortDir, SortKey, UserStore};

use super::dto::{ListQuery, ListingRequest, ListingView, ListingsPage};

const MIN_TITLE_LEN: usize = 3;
const MAX_TITLE_LEN: usize = 100;
const MIN_DESC_LEN: usize = 10;
const MAX_DESC_LEN: usize = 2000;
const MIN_PRICE: i64 = 1;
const MAX_PRICE: i64 = 1_000_000_000;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

// Compared against the last 4 bytes of the URL, so the five-byte entries
// ".jpeg" and ".webp" can never match and such URLs are rejected. Kept
// bug-compatible with the behavior this service replaces.
const ALLOWED_IMAGE_SUFFIXES: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];

/// Listing creation and retrieval over pluggable stores. Views are
/// enriched with the author's login, looked up best-effort.
#[derive(Clone)]
pub struct ListingService {
    listings: Arc<dyn ListingStore>,
    users: Arc<dyn UserStore>,
}

impl ListingService {
    pub fn new(listings: Arc<dyn ListingStore>, users: Arc<dyn UserStore>) -> Self {
        Self { listings, users }
    }

    /// Validates and persists a listing, returning a view with the author
    /// login filled in and `is_own_listing` set for the author.
    pub async fn create(&self, req: ListingRequest, author_id: i64) -> Result<ListingView> {
        validate_request(&req)?;

        let listing = self
            .listings
            .create(NewListing {
                title: req.title,
                description: req.description,
                image_url: req.image_url,
                price: req.price,
                author_id,
            })
            .await?;

        let author_login = self.author_login(author_id).await;
        Ok(ListingView::new(listing, author_login, Some(author_id)))
    }

    /// One page of listings plus page metadata. Out-of-range paging and
    /// unknown sort parameters fall back to defaults rather than erroring.
    pub async fn list_paged(
        &self,
        query: &ListQuery,
        current_user_id: Option<i64>,
    ) -> Result<ListingsPage> {
        let page = query.page.unwrap_or(1).max(1);
        let page_size = match query.page_size.unwrap_or(DEFAULT_PAGE_SIZE) {
            n if n < 1 => DEFAULT_PAGE_SIZE,
            n if n > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            n => n,
        };
        let sort = parse_sort(query);
        let filter = ListingFilter {
            min_price: query.min_price,
            max_price: query.max_price,
        };

        let (items, total_count) = self
            .listings
            .get_paged(filter, sort, page, page_size)
            .await?;
        let listings = self.enrich(items, current_user_id).await;

        let total_pages = ((total_count + page_size - 1) / page_size).max(1);

        Ok(ListingsPage {
            count: listings.len(),
            listings,
            total_count,
            page,
            page_size,
            total_pages,
        })
    }

    /// Unpaginated variant of `list_paged`, same filter and sort handling.
    pub async fn list(
        &self,
        query: &ListQuery,
        current_user_id: Option<i64>,
    ) -> Result<Vec<ListingView>> {
        let sort = parse_sort(query);
        let filter = ListingFilter {
            min_price: query.min_price,
            max_price: query.max_price,
        };
        let items = self.listings.get_all(filter, sort).await?;
        Ok(self.enrich(items, current_user_id).await)
    }

    async fn enrich(
        &self,
        items: Vec<crate::domain::Listing>,
        current_user_id: Option<i64>,
    ) -> Vec<ListingView> {
        let mut views = Vec::with_capacity(items.len());
        for listing in items {
            let author_login = self.author_login(listing.author_id).await;
            views.push(ListingView::new(listing, author_login, current_user_id));
        }
        views
    }

    // A listing whose author no longer resolves still renders, with an
    // empty login.
    async fn author_login(&self, author_id: i64) -> String {
        match self.users.get_by_id(author_id).await {
            Ok(author) => author.login,
            Err(_) => String::new(),
        }
    }
}

fn parse_sort(query: &ListQuery) -> ListingSort {
    let key = match query.sort.as_deref() {
        Some("price") => SortKey::Price,
        _ => SortKey::Date,
    };
    let dir = match query.order.as_deref() {
        Some("asc") => SortDir::Asc,
        _ => SortDir::Desc,
    };
    ListingSort { key, dir }
}

fn validate_request(req: &ListingRequest) -> Result<()> {
    if req.title.len() < MIN_TITLE_LEN || req.title.len() > MAX_TITLE_LEN {
        return Err(Error::Validation(format!(
            "title must be between {MIN_TITLE_LEN} and {MAX_TITLE_LEN} characters"
        )));
    }
    if req.description.len() < MIN_DESC_LEN || req.description.len() > MAX_DESC_LEN {
        return Err(Error::Validation(format!(
            "description must be between {MIN_DESC_LEN} and {MAX_DESC_LEN} characters"
        )));
    }
    if req.price < MIN_PRICE || req.price > MAX_PRICE {
        return Err(Error::Validation(format!(
            "price must be between {MIN_PRICE} and {MAX_PRICE}"
        )));
    }
    if let Some(url) = req.image_url.as_deref() {
        if !url.is_empty() && !has_allowed_suffix(url) {
            return Err(Error::Validation("unsupported image format".into()));
        }
    }
    Ok(())
}

fn has_allowed_suffix(url: &str) -> bool {
    let suffix = url
        .len()
        .checked_sub(4)
        .and_then(|start| url.get(start..))
        .unwrap_or("");
    ALLOWED_IMAGE_SUFFIXES.contains(&suffix)
}
