//! Router-level tests for the proxy endpoint, driven with a recording stub
//! in place of the Gemini API.

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use gemini_proxy::handlers::proxy::MAX_REQUEST_BODY_BYTES;
use gemini_proxy::services::providers::mock::MockTextProvider;
use gemini_proxy::{build_router, AppState};
use secrecy::Secret;
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

const PROXY_PATH: &str = "/.netlify/functions/gemini-proxy";
const HELLO_BODY: &str = r#"{"contents":[{"role":"user","parts":[{"text":"hello"}]}]}"#;

fn app(provider: &Arc<MockTextProvider>, api_key: Option<&str>) -> Router {
    build_router(AppState::new(
        api_key.map(|k| Secret::new(k.to_string())),
        provider.clone(),
    ))
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: &str,
) -> (StatusCode, HeaderMap, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn non_post_methods_are_rejected_without_upstream_call() {
    let provider = Arc::new(MockTextProvider::replying("unused"));

    for method in [
        Method::GET,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ] {
        let (status, headers, body) =
            send(app(&provider, Some("key")), method.clone(), PROXY_PATH, HELLO_BODY).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{}", method);
        assert_eq!(headers[header::ALLOW], "POST");
        assert_eq!(body, r#"{"error":"Method Not Allowed"}"#);
    }

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn missing_api_key_is_a_configuration_error() {
    let provider = Arc::new(MockTextProvider::replying("unused"));

    for key in [None, Some(""), Some("   ")] {
        let (status, headers, body) =
            send(app(&provider, key), Method::POST, PROXY_PATH, HELLO_BODY).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            body,
            r#"{"error":"Server configuration error: API key missing."}"#
        );
    }

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn credential_is_checked_before_body() {
    let provider = Arc::new(MockTextProvider::replying("unused"));

    let (status, _, body) = send(app(&provider, None), Method::POST, PROXY_PATH, "{not json").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("API key missing"));
}

#[tokio::test]
async fn successful_generation_is_wrapped_in_envelope() {
    let provider = Arc::new(MockTextProvider::replying("hi there"));

    let (status, headers, body) =
        send(app(&provider, Some("key")), Method::POST, PROXY_PATH, HELLO_BODY).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(
        body,
        r#"{"candidates":[{"content":{"parts":[{"text":"hi there"}]}}]}"#
    );

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "mock-model");
    assert_eq!(
        calls[0].request.contents[0].parts[0].text.as_deref(),
        Some("hello")
    );
}

#[tokio::test]
async fn upstream_failure_is_reported_with_details() {
    let provider = Arc::new(MockTextProvider::failing("quota exceeded"));

    let (status, headers, body) =
        send(app(&provider, Some("key")), Method::POST, PROXY_PATH, HELLO_BODY).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(
        body,
        r#"{"error":"Error calling the Gemini API.","details":"quota exceeded"}"#
    );
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn generation_config_is_passed_through_unchanged() {
    let provider = Arc::new(MockTextProvider::replying("ok"));
    let generation_config = json!({
        "temperature": 0.7,
        "maxOutputTokens": 256,
        "topK": 40,
        "stopSequences": ["END"],
        "responseMimeType": "application/json",
        "somethingNew": {"nested": [1, 2, 3]}
    });
    let body = json!({
        "contents": [{"role": "user", "parts": [{"text": "hello"}]}],
        "generationConfig": generation_config
    })
    .to_string();

    let (status, _, _) = send(app(&provider, Some("key")), Method::POST, PROXY_PATH, &body).await;
    assert_eq!(status, StatusCode::OK);

    let calls = provider.calls();
    let forwarded = calls[0].request.generation_config.clone().unwrap();
    assert_eq!(serde_json::Value::Object(forwarded), generation_config);
}

#[tokio::test]
async fn identical_requests_yield_identical_bodies() {
    let provider = Arc::new(MockTextProvider::replying("deterministic"));

    let (_, _, first) =
        send(app(&provider, Some("key")), Method::POST, PROXY_PATH, HELLO_BODY).await;
    let (_, _, second) =
        send(app(&provider, Some("key")), Method::POST, PROXY_PATH, HELLO_BODY).await;

    assert_eq!(first, second);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let provider = Arc::new(MockTextProvider::replying("unused"));

    let (status, headers, body) =
        send(app(&provider, Some("key")), Method::POST, PROXY_PATH, "{\"contents\": [").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "Invalid request body.");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn structurally_invalid_bodies_are_bad_requests() {
    let provider = Arc::new(MockTextProvider::replying("unused"));

    for body in [
        "",
        "null",
        "[]",
        r#"{"generationConfig":{"temperature":1}}"#,
        r#"{"contents":"hello"}"#,
        r#"{"contents":[]}"#,
        r#"{"contents":[{"parts":[{"text":"hi"}]}],"generationConfig":"hot"}"#,
    ] {
        let (status, _, _) = send(app(&provider, Some("key")), Method::POST, PROXY_PATH, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    }

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn api_route_serves_the_same_handler() {
    let provider = Arc::new(MockTextProvider::replying("from api route"));

    let (status, _, body) = send(
        app(&provider, Some("key")),
        Method::POST,
        "/api/gemini-proxy",
        HELLO_BODY,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("from api route"));
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let provider = Arc::new(MockTextProvider::replying("ok"));

    let response = app(&provider, Some("key"))
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(PROXY_PATH)
                .header("x-request-id", "req-42")
                .body(Body::from(HELLO_BODY))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
}

#[tokio::test]
async fn health_reports_model_and_readiness_tracks_credential() {
    let provider = Arc::new(MockTextProvider::replying("ok"));

    let (status, _, body) = send(app(&provider, Some("key")), Method::GET, "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "gemini-proxy");
    assert_eq!(body["model"], "mock-model");

    let (ready, _, _) = send(app(&provider, Some("key")), Method::GET, "/ready", "").await;
    assert_eq!(ready, StatusCode::OK);

    let (not_ready, _, _) = send(app(&provider, None), Method::GET, "/ready", "").await;
    assert_eq!(not_ready, StatusCode::SERVICE_UNAVAILABLE);
}

/// A single-turn body carrying an inline image of roughly `data_len` bytes.
fn inline_image_body(data_len: usize) -> String {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                {"text": "describe this"},
                {"inlineData": {"mimeType": "image/png", "data": "A".repeat(data_len)}}
            ]
        }]
    })
    .to_string()
}

#[tokio::test]
async fn large_inline_image_within_limit_is_forwarded() {
    let provider = Arc::new(MockTextProvider::replying("a cat"));
    let body = inline_image_body(3 * 1024 * 1024);

    let (status, _, response) =
        send(app(&provider, Some("key")), Method::POST, PROXY_PATH, &body).await;

    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("a cat"));
    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    let data = &calls[0].request.contents[0].parts[1].extra["inlineData"]["data"];
    assert_eq!(data.as_str().map(str::len), Some(3 * 1024 * 1024));
}

#[tokio::test]
async fn oversized_post_is_rejected_with_json() {
    let provider = Arc::new(MockTextProvider::replying("unused"));
    let body = inline_image_body(MAX_REQUEST_BODY_BYTES + 1);

    let (status, headers, response) =
        send(app(&provider, Some("key")), Method::POST, PROXY_PATH, &body).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    let response: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(response["error"], "Request body too large.");
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn oversized_non_post_is_still_method_not_allowed() {
    let provider = Arc::new(MockTextProvider::replying("unused"));
    let body = inline_image_body(MAX_REQUEST_BODY_BYTES + 1);

    let (status, headers, response) =
        send(app(&provider, Some("key")), Method::PUT, PROXY_PATH, &body).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(response, r#"{"error":"Method Not Allowed"}"#);
    assert_eq!(provider.call_count(), 0);
}
