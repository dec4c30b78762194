//! Tests for Notion client functionality.

use std::time::Duration;

use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{NotionClient, NotionConfig};
use crate::error::NotionError;
use crate::retry::RetryConfig;

// =============================================================================
// Test Helpers
// =============================================================================

fn test_config(base_url: String) -> NotionConfig {
    NotionConfig {
        base_url,
        timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 10,
            max_delay_ms: 50,
        },
        ..NotionConfig::new("test-key", "db-1")
    }
}

fn test_client(base_url: String) -> NotionClient {
    NotionClient::new(test_config(base_url)).unwrap()
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status_429() {
    let err = NotionError::from_http_status(429, "rate limited", Some(2000));
    assert!(matches!(err, NotionError::RateLimited(2000)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_500() {
    let err = NotionError::from_http_status(500, "internal error", None);
    assert!(matches!(err, NotionError::ServerError(500, _)));
    assert!(err.is_retryable());
}

#[test]
fn test_error_from_http_status_400() {
    let err = NotionError::from_http_status(400, "bad request", None);
    assert!(matches!(err, NotionError::RequestFailed(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_404() {
    let err = NotionError::from_http_status(404, "not found", None);
    assert!(matches!(err, NotionError::NotFound(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_from_http_status_401() {
    let err = NotionError::from_http_status(401, "unauthorized", None);
    assert!(matches!(err, NotionError::AuthError(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_error_http_status_getter() {
    assert_eq!(NotionError::RateLimited(1000).http_status(), Some(429));
    assert_eq!(
        NotionError::ServerError(502, "bad gateway".into()).http_status(),
        Some(502)
    );
    assert_eq!(NotionError::NotFound("page".into()).http_status(), Some(404));
}

#[test]
fn test_error_retry_after_ms() {
    assert_eq!(NotionError::RateLimited(5000).retry_after_ms(), Some(5000));
    assert_eq!(
        NotionError::ServerError(500, "error".into()).retry_after_ms(),
        None
    );
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
#[serial]
fn test_config_from_env_requires_credentials() {
    std::env::remove_var("NOTION_API_KEY");
    std::env::remove_var("NOTION_DATABASE_ID");
    assert!(NotionConfig::from_env().is_err());
}

#[test]
#[serial]
fn test_config_from_env_defaults() {
    std::env::set_var("NOTION_API_KEY", "test-key");
    std::env::set_var("NOTION_DATABASE_ID", "db-1");
    std::env::remove_var("NOTION_DATA_SOURCE_ID");
    std::env::remove_var("NOTION_VERSION");

    let config = NotionConfig::from_env().unwrap();
    assert_eq!(config.notion_version, "2022-06-28");
    assert_eq!(config.base_url, "https://api.notion.com/v1");
    assert!(config.data_source_id.is_none());

    std::env::remove_var("NOTION_API_KEY");
    std::env::remove_var("NOTION_DATABASE_ID");
}

// =============================================================================
// Client Tests
// =============================================================================

#[tokio::test]
async fn test_create_page_returns_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pages"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("notion-version", "2022-06-28"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "page-1"})))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let id = client
        .create_page(json!({"Headline": {"rich_text": []}}))
        .await
        .unwrap();
    assert_eq!(id, "page-1");
}

#[tokio::test]
async fn test_update_page_identical_payload_converges() {
    let server = MockServer::start().await;

    let properties = json!({"Status": {"status": {"name": "Generated"}}});

    Mock::given(method("PATCH"))
        .and(path("/pages/page-1"))
        .and(body_json(json!({"properties": properties.clone()})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "page-1"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    // Re-issuing the same keyed update overwrites rather than duplicates
    client.update_page("page-1", properties.clone()).await.unwrap();
    client.update_page("page-1", properties).await.unwrap();
}

#[tokio::test]
async fn test_query_database_follows_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/databases/db-1/query"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "a"}],
            "has_more": true,
            "next_cursor": "cursor-2"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/databases/db-1/query"))
        .and(body_json(json!({"start_cursor": "cursor-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "b"}],
            "has_more": false,
            "next_cursor": null
        })))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let results = client.query_database(None, None).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["id"], "a");
    assert_eq!(results[1]["id"], "b");
}

#[tokio::test]
async fn test_request_retries_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pages"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "page-2"})))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let id = client.create_page(json!({})).await.unwrap();
    assert_eq!(id, "page-2");
}

#[tokio::test]
async fn test_request_does_not_retry_on_client_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pages"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let err = client.create_page(json!({})).await.unwrap_err();
    assert!(matches!(err, NotionError::RequestFailed(_)));
}

#[tokio::test]
async fn test_get_page_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pages/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let err = client.get_page("missing").await.unwrap_err();
    assert!(matches!(err, NotionError::NotFound(_)));
}

#[tokio::test]
async fn test_property_types_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/databases/db-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {
                "Set ID": {"type": "title"},
                "Headline": {"type": "rich_text"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let first = client.property_types().await.unwrap();
    let second = client.property_types().await.unwrap();
    assert_eq!(first.get("Set ID").map(String::as_str), Some("title"));
    assert_eq!(first, second);
}
