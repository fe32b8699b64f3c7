use axum::Router;

use crate::state::AppState;

mod dto;
mod handlers;
mod service;

pub use service::ListingService;

pub fn router() -> Router<AppState> {
    handlers::router()
}
