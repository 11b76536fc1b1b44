use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid input
    #[error("{0}")]
    Validation(String),

    /// Missing/invalid/expired token or bad credentials
    #[error("{0}")]
    Auth(String),

    /// Referenced document is absent
    #[error("{0}")]
    NotFound(String),

    /// Unexpected store failure
    #[error("Server error: {0}")]
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Error::Auth(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Auth(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            Error::Validation(msg) | Error::Auth(msg) | Error::NotFound(msg) => {
                json!({ "message": msg })
            }
            Error::Internal(detail) => {
                error!("Internal error: {}", detail);
                json!({ "message": "Server error", "error": detail })
            }
        };

        (status, Json(body)).into_response()
    }
}

// Store and crypto failures all surface as 500s
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(format!("{:#}", err))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Internal(err.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: Error) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_taxonomy_maps_to_status_and_message() {
        let (status, body) = body_json(Error::validation("Please add all fields")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Please add all fields");

        let (status, body) = body_json(Error::auth("Not authorized, no token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, no token");

        let (status, body) = body_json(Error::not_found("Post not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Post not found");
    }

    #[tokio::test]
    async fn test_internal_hides_detail_behind_generic_message() {
        let (status, body) = body_json(anyhow::anyhow!("disk full").into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server error");
        assert_eq!(body["error"], "disk full");
    }
}
