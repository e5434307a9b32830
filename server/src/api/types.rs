//! Shared API types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Standard API error response, rendered as `{"error": message}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn resource_not_found(name: &str) -> Self {
        Self::not_found(format!("Resource not found: {}", name))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message } | Self::NotFound { message } | Self::Internal { message } => {
                message
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (Self::BadRequest { message } | Self::NotFound { message } | Self::Internal { message }) =
            self;
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
