//! HTTP error mapping

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use signet_core::Error;
use thiserror::Error as ThisError;

/// Errors surfaced by the HTTP shell as `{"error": "<message>"}`
#[derive(Debug, ThisError)]
pub enum ApiError {
    /// A core operation failed
    #[error("{0}")]
    Core(#[from] Error),

    /// The request body failed shell-level validation
    #[error("{0}")]
    Validation(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => match err {
                // validation, signature, lookup failures, and the sync
                // directive are the caller's problem
                Error::InvalidBlock(_)
                | Error::InvalidChain(_)
                | Error::Signature(_)
                | Error::PendingNotFound(_)
                | Error::UnknownPeer(_)
                | Error::SyncNeeded { .. }
                | Error::InvalidNodeName(_)
                | Error::Serialization(_) => StatusCode::BAD_REQUEST,
                Error::Key(_) | Error::Config(_) | Error::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                Error::Transport(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
        }))
    }
}
