use crate::error::ProxyError;
use crate::models::{GenerationRequest, GenerationResponse};
use crate::startup::AppState;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method},
    Json,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use secrecy::ExposeSecret;
use service_core::middleware::REQUEST_ID_HEADER;
use validator::Validate;

/// Largest request body the proxy will buffer (matches Netlify's payload cap).
pub const MAX_REQUEST_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Buffer the request body, refusing anything over `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    let collected = Limited::new(body, limit).collect().await.map_err(|e| {
        if e.downcast_ref::<LengthLimitError>().is_some() {
            ProxyError::PayloadTooLarge { limit }
        } else {
            ProxyError::InvalidBody(format!("Failed to read body: {}", e))
        }
    })?;
    Ok(collected.to_bytes())
}

/// Decode and validate a raw request body.
pub fn parse_generation_request(body: &[u8]) -> Result<GenerationRequest, ProxyError> {
    let request: GenerationRequest = serde_json::from_slice(body)?;
    request.validate()?;
    Ok(request)
}

/// Forward a chat payload to the upstream model and wrap the generated text
/// in the response envelope.
///
/// Mounted for every method; anything but `POST` is rejected before the
/// credential or body is looked at. The body is taken unbuffered so the size
/// limit only applies once the method and credential checks have passed.
pub async fn gemini_proxy(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<GenerationResponse>, ProxyError> {
    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    if method != Method::POST {
        tracing::debug!(request_id, method = %method, "Rejecting non-POST request");
        return Err(ProxyError::MethodNotAllowed);
    }

    let api_key = state
        .api_key
        .as_ref()
        .filter(|key| !key.expose_secret().trim().is_empty())
        .ok_or_else(|| {
            tracing::error!(request_id, "GEMINI_API_KEY environment variable is not set");
            ProxyError::MissingApiKey
        })?;

    let body = read_body(body, MAX_REQUEST_BODY_BYTES).await.map_err(|e| {
        tracing::warn!(request_id, error = %e, "Rejecting unreadable request body");
        e
    })?;

    let request = parse_generation_request(&body).map_err(|e| {
        tracing::warn!(request_id, error = %e, "Rejecting malformed request body");
        e
    })?;

    let text = state
        .provider
        .generate(api_key, &request)
        .await
        .map_err(|e| {
            tracing::error!(
                request_id,
                model = %state.provider.model(),
                error = %e,
                "Error from Gemini API"
            );
            ProxyError::from(e)
        })?;

    tracing::info!(
        request_id,
        model = %state.provider.model(),
        turns = request.contents.len(),
        output_len = text.len(),
        "Generation completed"
    );

    Ok(Json(GenerationResponse::from_text(text)))
}
