use crate::services::providers::ProviderError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Every way a proxy request can end without generated text.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Server configuration error: API key missing.")]
    MissingApiKey,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Error calling the Gemini API: {0}")]
    Upstream(#[from] ProviderError),
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        ProxyError::InvalidBody(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ProxyError {
    fn from(err: validator::ValidationErrors) -> Self {
        ProxyError::InvalidBody(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        // The configuration fault carries no details.
        let (status, error_message, details) = match self {
            ProxyError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed".to_string(),
                None,
            ),
            ProxyError::MissingApiKey => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Server configuration error: API key missing.".to_string(),
                None,
            ),
            ProxyError::InvalidBody(msg) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body.".to_string(),
                Some(msg),
            ),
            ProxyError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large.".to_string(),
                Some(format!("Request body exceeds {} bytes", limit)),
            ),
            ProxyError::Upstream(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error calling the Gemini API.".to_string(),
                Some(err.to_string()),
            ),
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response();

        if status == StatusCode::METHOD_NOT_ALLOWED {
            res.headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }

        res
    }
}
