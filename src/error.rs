use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error taxonomy shared by services and stores. Handlers return these and
/// let `IntoResponse` pick the status code.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Error::Auth(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            Error::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            Error::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            // Never leak the underlying failure to the client.
            Error::Store(e) => {
                tracing::error!(error = %e, "store failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
            Error::Internal(e) => {
                tracing::error!(error = %e, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let res = Error::Validation("title too short".into()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = Error::Conflict("login taken".into()).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = Error::Auth("invalid token".into()).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn store_errors_are_opaque() {
        let res = Error::Store(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
