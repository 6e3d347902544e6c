//! Server error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use parable_study::SourceError;

/// All errors that can occur in the server.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Parable not found: {0}")]
    ParableNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Source(SourceError::Empty) | ServerError::ParableNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to clients. Upstream details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::Source(SourceError::Unavailable(_)) => "Failed to fetch data".to_string(),
            ServerError::Source(SourceError::Empty) => "No data found".to_string(),
            ServerError::ParableNotFound(_) => self.to_string(),
            _ => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self}");
        }
        (
            status,
            Json(serde_json::json!({ "error": self.public_message() })),
        )
            .into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
