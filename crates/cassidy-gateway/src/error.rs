//! Gateway error taxonomy and its HTTP mapping.
//!
//! Every error is converted at the route boundary into a JSON
//! `{"error": string}` body. 4xx messages describe what the client got
//! wrong; 5xx messages are generic and the detail goes to the server log
//! only.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use cassidy_memory::MemoryError;
use cassidy_providers::ProviderError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid proxy key")]
    Unauthorized,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("vision request is missing an image")]
    MissingImage,

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Upstream(#[from] ProviderError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl GatewayError {
    fn client_message(&self) -> String {
        match self {
            Self::Unauthorized => "Unauthorized: invalid proxy key.".to_string(),
            Self::InvalidRequest(msg) => msg.clone(),
            Self::MissingImage => "Vision request is missing an image.".to_string(),
            Self::Memory(MemoryError::InvalidBankShape) => {
                "Memory bank must be a JSON object.".to_string()
            }
            Self::Memory(_) => "Memory store error.".to_string(),
            Self::Upstream(_) => "Proxy error occurred.".to_string(),
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) | Self::MissingImage => StatusCode::BAD_REQUEST,
            Self::Memory(MemoryError::InvalidBankShape) => StatusCode::BAD_REQUEST,
            Self::Memory(_) | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.client_message(),
        })
    }
}
