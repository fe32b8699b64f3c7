use axum::Router;

use crate::state::AppState;

mod dto;
pub(crate) mod extract;
mod handlers;
pub mod jwt;
mod password;
mod service;

pub use service::AuthService;

pub fn router() -> Router<AppState> {
    handlers::router()
}
