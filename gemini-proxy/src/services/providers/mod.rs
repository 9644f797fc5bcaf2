//! Upstream generation providers.
//!
//! The proxy handler only talks to the [`TextProvider`] trait, so the real
//! Gemini client can be swapped for a stub in tests.

pub mod gemini;
pub mod mock;

use crate::models::GenerationRequest;
use async_trait::async_trait;
use secrecy::Secret;
use thiserror::Error;

/// Error type for provider operations.
///
/// The `Display` output is returned to callers as the `details` field of an
/// upstream failure, so it must never contain the credential.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Gemini API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request to Gemini API timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),

    #[error("Response was blocked due to {0}")]
    Blocked(String),

    /// Failure reported verbatim by the upstream.
    #[error("{0}")]
    Upstream(String),
}

/// Text generation backend.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Model identifier every request is sent to.
    fn model(&self) -> &str;

    /// Submit the conversation and return the generated text.
    async fn generate(
        &self,
        api_key: &Secret<String>,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError>;
}
