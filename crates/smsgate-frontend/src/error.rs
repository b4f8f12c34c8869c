use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::classify::ClassifyError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Classify(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
