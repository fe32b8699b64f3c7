use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument};

use crate::error::Result;
use crate::state::AppState;

use super::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let user = state.auth.register(&payload.login, &payload.password).await?;
    info!(user_id = user.id, login = %user.login, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user: user.into() }),
    ))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (token, user) = state.auth.login(&payload.login, &payload.password).await?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        login: user.login,
    }))
}
