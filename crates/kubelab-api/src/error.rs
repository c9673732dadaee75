//! Error types for the todo API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Result type for todo API operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for todo API operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request payload failed validation
    #[error("{0}")]
    Validation(String),

    /// Item (or route) does not exist
    #[error("{0}")]
    NotFound(String),

    /// Backing store unreachable or the operation failed
    #[error("store error: {0}")]
    Store(String),

    /// Stored value could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Not-found error for an item id
    pub fn item_not_found(id: &str) -> Self {
        Error::NotFound(format!("item {} not found", id))
    }

    /// Machine-readable error kind used in response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::Store(_) => "store_error",
            Error::Serialization(_) => "serialization_error",
            Error::Config(_) => "configuration_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Store(_)
            | Error::Serialization(_)
            | Error::Config(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self, kind = self.kind(), "request failed");
        }

        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::Store(e.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| match e.message.as_deref() {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid ({})", field, e.code),
                })
            })
            .collect();
        messages.sort();
        Error::Validation(messages.join("; "))
    }
}
