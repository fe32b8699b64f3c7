use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::Listing;

#[derive(Debug, Deserialize)]
pub struct ListingRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: i64,
}

/// Listing enriched with the author's login and, for authenticated
/// callers, an ownership flag.
#[derive(Debug, Serialize)]
pub struct ListingView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: i64,
    pub author_id: i64,
    pub author_login: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_own_listing: Option<bool>,
}

impl ListingView {
    pub fn new(listing: Listing, author_login: String, current_user_id: Option<i64>) -> Self {
        let is_own_listing = current_user_id.map(|id| listing.author_id == id);
        Self {
            id: listing.id,
            title: listing.title,
            description: listing.description,
            image_url: listing.image_url,
            price: listing.price,
            author_id: listing.author_id,
            author_login,
            created_at: listing.created_at,
            is_own_listing,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingsPage {
    pub listings: Vec<ListingView>,
    pub count: usize,
    pub total_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateListingResponse {
    pub listing: ListingView,
}

/// Raw query parameters of GET /listings. Out-of-range values are
/// normalized by the service, not rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}
