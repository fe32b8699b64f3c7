use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::extract::{AuthUser, OptionalAuthUser};
use crate::error::{Error, Result};
use crate::state::AppState;

use super::dto::{CreateListingResponse, ListQuery, ListingRequest, ListingsPage};

pub fn router() -> Router<AppState> {
    Router::new().route("/listings", get(list_listings).post(create_listing))
}

#[instrument(skip(state))]
async fn list_listings(
    State(state): State<AppState>,
    OptionalAuthUser(user): OptionalAuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListingsPage>> {
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(Error::Validation(
                "min_price cannot be greater than max_price".into(),
            ));
        }
    }

    let current_user_id = user.map(|u| u.id);
    let page = state.listings.list_paged(&query, current_user_id).await?;
    Ok(Json(page))
}

#[instrument(skip(state, payload))]
async fn create_listing(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ListingRequest>,
) -> Result<(StatusCode, Json<CreateListingResponse>)> {
    let listing = state.listings.create(payload, user.id).await?;
    info!(listing_id = listing.id, author_id = user.id, "listing created");
    Ok((
        StatusCode::CREATED,
        Json(CreateListingResponse { listing }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::state::AppState;
    use crate::store::{MemoryListingStore, MemoryUserStore};
    use std::sync::Arc;

    fn make_state() -> AppState {
        AppState::with_stores(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryListingStore::new()),
            &JwtConfig::for_tests(),
        )
    }

    #[tokio::test]
    async fn inverted_price_bounds_are_rejected_before_the_service_runs() {
        let state = make_state();
        let query = ListQuery {
            min_price: Some(200),
            max_price: Some(100),
            ..Default::default()
        };
        let err = list_listings(State(state), OptionalAuthUser(None), Query(query))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn equal_price_bounds_are_allowed() {
        let state = make_state();
        let query = ListQuery {
            min_price: Some(100),
            max_price: Some(100),
            ..Default::default()
        };
        let page = list_listings(State(state), OptionalAuthUser(None), Query(query))
            .await
            .unwrap();
        assert_eq!(page.0.total_count, 0);
    }
}
