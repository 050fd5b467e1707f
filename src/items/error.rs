use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("{0}")]
    Validation(String),
    #[error("item not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for ItemError {
    fn from(e: sqlx::Error) -> Self {
        ItemError::Internal(e.into())
    }
}

impl IntoResponse for ItemError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ItemError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ItemError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ItemError::Internal(e) => {
                error!(error = %e, "item store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
