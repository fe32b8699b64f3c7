use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::domain::PublicUser;
use crate::error::Error;
use crate::state::AppState;

/// Requires a valid bearer token; rejects with 401 otherwise.
/// Runs the full validation path including the user-exists check.
#[derive(Debug)]
pub struct AuthUser(pub PublicUser);

/// Like `AuthUser`, but a missing or invalid token yields an anonymous
/// request instead of a rejection.
#[derive(Debug)]
pub struct OptionalAuthUser(pub Option<PublicUser>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    // Accept both "Bearer <token>" and a raw token value.
    Some(
        header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .unwrap_or(header),
    )
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| Error::Auth("missing Authorization header".into()))?;
        let user = state.auth.validate_token(token).await?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match bearer_token(parts) {
            Some(token) => state.auth.validate_token(token).await.ok(),
            None => None,
        };
        Ok(OptionalAuthUser(user))
    }
}
