use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidQuoteInput(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("No zone found")]
    ZoneNotFound,

    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidQuoteInput(msg) | ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ApiError::ZoneNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Store(err) => {
                // Query details stay out of the response body.
                tracing::error!(%err, "store operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::InvalidQuoteInput("weight".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ZoneNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Store(sqlx::Error::PoolClosed).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
