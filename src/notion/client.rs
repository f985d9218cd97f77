use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SourceConfig;
use crate::error::ContentError;
use crate::notion::types::{QueryRequest, QueryResponse, RecordMap};

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// The query capability the adapter depends on.
///
/// This trait allows mocking the remote document database in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotionApi: Send + Sync {
    /// Run a database query, returning one page of results plus a
    /// continuation cursor.
    async fn query_database(
        &self,
        database_id: &str,
        request: QueryRequest,
    ) -> Result<QueryResponse, ContentError>;

    /// Fetch the structured body of a single document. Used only for
    /// single-document views, never for lists.
    async fn fetch_record_map(&self, page_id: &str) -> Result<RecordMap, ContentError>;

    /// Create a new row in a database (subscriber intake).
    async fn create_page(
        &self,
        database_id: &str,
        properties: serde_json::Value,
    ) -> Result<(), ContentError>;
}

/// One configured document source: a query capability bound to a database id.
#[derive(Clone)]
pub struct Source {
    pub api: Arc<dyn NotionApi>,
    pub database_id: String,
}

impl Source {
    /// Build a source backed by the real HTTP client.
    pub fn from_config(config: &SourceConfig) -> Result<Self, ContentError> {
        Ok(Self {
            api: Arc::new(NotionClient::new(&config.api_key)?),
            database_id: config.database_id.clone(),
        })
    }
}

/// Error body shape returned by the Notion API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP implementation of `NotionApi` against `api.notion.com`.
pub struct NotionClient {
    http: reqwest::Client,
    token: String,
}

impl NotionClient {
    pub fn new(token: impl Into<String>) -> Result<Self, ContentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ContentError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            token: token.into(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{NOTION_API_BASE}{path}"))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Map a non-success response to the adapter error taxonomy. A 400 with
    /// `code = "validation_error"` means a filter or sort referenced a
    /// property the schema no longer has.
    async fn error_for(response: reqwest::Response) -> ContentError {
        let status = response.status().as_u16();
        let body: ApiErrorBody = response.json().await.unwrap_or(ApiErrorBody {
            code: None,
            message: None,
        });
        let message = body.message.unwrap_or_else(|| "unknown error".to_string());

        if body.code.as_deref() == Some("validation_error") {
            ContentError::SchemaValidation(message)
        } else {
            ContentError::Api { status, message }
        }
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ContentError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ContentError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ContentError::Network(format!("Failed to parse Notion response: {e}")))
    }
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn query_database(
        &self,
        database_id: &str,
        request: QueryRequest,
    ) -> Result<QueryResponse, ContentError> {
        self.send_json(
            self.request(
                reqwest::Method::POST,
                &format!("/databases/{database_id}/query"),
            )
            .json(&request),
        )
        .await
    }

    async fn fetch_record_map(&self, page_id: &str) -> Result<RecordMap, ContentError> {
        let body: serde_json::Value = self
            .send_json(self.request(
                reqwest::Method::GET,
                &format!("/blocks/{page_id}/children?page_size=100"),
            ))
            .await?;

        Ok(RecordMap(body))
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: serde_json::Value,
    ) -> Result<(), ContentError> {
        let body = serde_json::json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });

        let _: serde_json::Value = self
            .send_json(self.request(reqwest::Method::POST, "/pages").json(&body))
            .await?;

        Ok(())
    }
}
