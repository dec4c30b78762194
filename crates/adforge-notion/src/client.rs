//! Notion REST API client.
//!
//! Thin client over pages and database queries with:
//! - Database schema (property-type) introspection, cached per client
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Observability (tracing spans, metrics)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{NotionError, NotionResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};

// =============================================================================
// Configuration
// =============================================================================

/// Notion client configuration.
#[derive(Debug, Clone)]
pub struct NotionConfig {
    /// Integration API key
    pub api_key: String,
    /// Target database id
    pub database_id: String,
    /// Optional data source id (newer Notion APIs)
    pub data_source_id: Option<String>,
    /// Notion-Version header value
    pub notion_version: String,
    /// API base URL
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl NotionConfig {
    pub fn new(api_key: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            database_id: database_id.into(),
            data_source_id: None,
            notion_version: "2022-06-28".to_string(),
            base_url: "https://api.notion.com/v1".to_string(),
            timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> NotionResult<Self> {
        let api_key = std::env::var("NOTION_API_KEY")
            .map_err(|_| NotionError::auth_error("NOTION_API_KEY must be set"))?;
        let database_id = std::env::var("NOTION_DATABASE_ID")
            .map_err(|_| NotionError::auth_error("NOTION_DATABASE_ID must be set"))?;

        if api_key.is_empty() || database_id.is_empty() {
            return Err(NotionError::auth_error(
                "NOTION_API_KEY and NOTION_DATABASE_ID cannot be empty",
            ));
        }

        let mut config = Self::new(api_key, database_id);
        config.data_source_id = std::env::var("NOTION_DATA_SOURCE_ID").ok().filter(|s| !s.is_empty());
        if let Ok(version) = std::env::var("NOTION_VERSION") {
            config.notion_version = version;
        }
        config.retry = RetryConfig::from_env();
        Ok(config)
    }
}

// =============================================================================
// Client
// =============================================================================

/// Notion REST API client.
#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    config: NotionConfig,
    schema_cache: Arc<RwLock<Option<HashMap<String, String>>>>,
}

impl NotionClient {
    /// Create a new Notion client.
    pub fn new(config: NotionConfig) -> NotionResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("adforge-notion/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(NotionError::Network)?;

        Ok(Self {
            http,
            config,
            schema_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> NotionResult<Self> {
        Self::new(NotionConfig::from_env()?)
    }

    /// The configured database id.
    pub fn database_id(&self) -> &str {
        &self.config.database_id
    }

    /// Property name → property type for the target database, cached after
    /// the first fetch.
    pub async fn property_types(&self) -> NotionResult<HashMap<String, String>> {
        if let Some(cached) = self.schema_cache.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let url = format!("{}/databases/{}", self.config.base_url, self.config.database_id);
        let body = self
            .execute("get_database", || self.http.get(&url))
            .await?;

        let properties = body
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| NotionError::InvalidResponse("Database schema missing properties".to_string()))?;

        let types: HashMap<String, String> = properties
            .iter()
            .filter_map(|(name, spec)| {
                spec.get("type")
                    .and_then(Value::as_str)
                    .map(|t| (name.clone(), t.to_string()))
            })
            .collect();

        *self.schema_cache.write().await = Some(types.clone());
        debug!(properties = types.len(), "Cached database schema");
        Ok(types)
    }

    /// Create a page in the configured database. Returns the page id.
    pub async fn create_page(&self, properties: Value) -> NotionResult<String> {
        let parent = match &self.config.data_source_id {
            Some(ds) => json!({"type": "data_source_id", "data_source_id": ds}),
            None => json!({"type": "database_id", "database_id": self.config.database_id}),
        };

        let url = format!("{}/pages", self.config.base_url);
        let body = json!({"parent": parent, "properties": properties});

        let page = self
            .execute("create_page", || self.http.post(&url).json(&body))
            .await?;

        page.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| NotionError::InvalidResponse("Created page has no id".to_string()))
    }

    /// Fetch one page by id.
    pub async fn get_page(&self, page_id: &str) -> NotionResult<Value> {
        let url = format!("{}/pages/{}", self.config.base_url, page_id);
        self.execute("get_page", || self.http.get(&url)).await
    }

    /// Update a page's properties. Re-issuing the same update is a no-op at
    /// the store, which is what makes record writes idempotent-by-id.
    pub async fn update_page(&self, page_id: &str, properties: Value) -> NotionResult<()> {
        let url = format!("{}/pages/{}", self.config.base_url, page_id);
        let body = json!({"properties": properties});

        self.execute("update_page", || self.http.patch(&url).json(&body))
            .await?;
        Ok(())
    }

    /// Query the database, following pagination cursors until exhausted.
    pub async fn query_database(
        &self,
        filter: Option<Value>,
        sorts: Option<Value>,
    ) -> NotionResult<Vec<Value>> {
        let url = format!("{}/databases/{}/query", self.config.base_url, self.config.database_id);

        let mut results = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = serde_json::Map::new();
            if let Some(filter) = &filter {
                body.insert("filter".to_string(), filter.clone());
            }
            if let Some(sorts) = &sorts {
                body.insert("sorts".to_string(), sorts.clone());
            }
            if let Some(cursor) = &cursor {
                body.insert("start_cursor".to_string(), json!(cursor));
            }
            let body = Value::Object(body);

            let page = self
                .execute("query_database", || self.http.post(&url).json(&body))
                .await?;

            if let Some(items) = page.get("results").and_then(Value::as_array) {
                results.extend(items.iter().cloned());
            }

            let has_more = page.get("has_more").and_then(Value::as_bool).unwrap_or(false);
            cursor = page
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if !has_more || cursor.is_none() {
                break;
            }
        }

        Ok(results)
    }

    /// Run a request with retry, auth headers and metrics.
    async fn execute<F>(&self, operation: &'static str, make: F) -> NotionResult<Value>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let start = Instant::now();

        let result = with_retry(&self.config.retry, operation, || async {
            let response = make()
                .bearer_auth(&self.config.api_key)
                .header("Notion-Version", &self.config.notion_version)
                .send()
                .await
                .map_err(NotionError::Network)?;

            let status = response.status();
            if !status.is_success() {
                let retry_after_ms = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<f64>().ok())
                    .map(|secs| (secs * 1000.0) as u64);
                let body = response.text().await.unwrap_or_default();
                return Err(NotionError::from_http_status(
                    status.as_u16(),
                    format!("{} failed: {}", operation, body),
                    retry_after_ms,
                ));
            }

            Ok(response.json::<Value>().await?)
        })
        .await;

        let latency_ms = start.elapsed().as_millis() as f64;
        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }
}
