// src/api/client.rs
//! Pure HTTP client wrapper for Notion API.
//!
//! This module provides a thin wrapper around reqwest for making
//! HTTP requests to the Notion API. It handles authentication and
//! retries; parsing lives in `parser`.

use super::pagination::fetch_all_pages;
use super::parser;
use super::responses::SearchRequest;
use crate::error::AppError;
use crate::error_recovery::{retry_linear, RetryPolicy};
use crate::model::{Block, Database, NotionObject, Page};
use crate::types::{ApiKey, NotionId};
use reqwest::{header, Client, Response};
use serde::Serialize;

const NOTION_VERSION: &str = "2022-06-28";
const API_BASE_URL: &str = "https://api.notion.com/v1";

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Points the client at another server, e.g. a local stub in tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Makes a GET request to the specified endpoint (without base URL).
    pub async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Response, AppError> {
        let url = self.url(endpoint);
        log::debug!("GET {} {:?}", url, query);
        Ok(self.client.get(url).query(query).send().await?)
    }

    /// Makes a POST request with JSON body to the specified endpoint.
    pub async fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Response, AppError> {
        let url = self.url(endpoint);
        log::debug!("POST {}", url);
        Ok(self.client.post(url).json(body).send().await?)
    }

    /// GET with retry, returning the body for the parser.
    async fn get_text(&self, endpoint: &str) -> Result<ApiResponse<String>, AppError> {
        retry_linear(self.retry_policy, &format!("GET {}", endpoint), || async {
            let response = self.get(endpoint, &[]).await?;
            let result = extract_response_text(response).await?;
            ensure_success(result)
        })
        .await
    }
}

#[async_trait::async_trait]
impl super::NotionRepository for NotionHttpClient {
    async fn retrieve_page(&self, id: &NotionId) -> Result<Page, AppError> {
        let result = self.get_text(&format!("pages/{}", id.to_hyphenated())).await?;
        parser::parse_page_response(result)
    }

    async fn retrieve_database(&self, id: &NotionId) -> Result<Database, AppError> {
        let result = self
            .get_text(&format!("databases/{}", id.to_hyphenated()))
            .await?;
        parser::parse_database_response(result)
    }

    async fn retrieve_block(&self, id: &NotionId) -> Result<Block, AppError> {
        let result = self.get_text(&format!("blocks/{}", id.to_hyphenated())).await?;
        parser::parse_block_response(result)
    }

    async fn retrieve_children(&self, parent: &NotionId) -> Result<Vec<Block>, AppError> {
        let endpoint = format!("blocks/{}/children", parent.to_hyphenated());
        fetch_all_pages(self.retry_policy, &endpoint, |page_size, cursor| {
            let endpoint = endpoint.clone();
            async move {
                let mut query = vec![("page_size", page_size.to_string())];
                if let Some(cursor) = cursor {
                    query.push(("start_cursor", cursor));
                }
                let response = self.get(&endpoint, &query).await?;
                let result = extract_response_text(response).await?;
                parser::parse_blocks_pagination(result)
            }
        })
        .await
    }

    async fn query_rows(&self, database: &NotionId) -> Result<Vec<Page>, AppError> {
        let endpoint = format!("databases/{}/query", database.to_hyphenated());
        fetch_all_pages(self.retry_policy, &endpoint, |page_size, cursor| {
            let endpoint = endpoint.clone();
            async move {
                let mut query = serde_json::json!({ "page_size": page_size });
                if let Some(cursor) = cursor {
                    query["start_cursor"] = serde_json::json!(cursor);
                }
                let response = self.post(&endpoint, &query).await?;
                let result = extract_response_text(response).await?;
                parser::parse_pages_pagination(result)
            }
        })
        .await
    }

    async fn retrieve_user_name(&self, user_id: &str) -> Result<String, AppError> {
        let result = self.get_text(&format!("users/{}", user_id)).await?;
        parser::parse_user_name(result)
    }

    async fn search_all(&self) -> Result<Vec<NotionObject>, AppError> {
        fetch_all_pages(self.retry_policy, "search", |page_size, start_cursor| async move {
            let body = SearchRequest {
                page_size,
                start_cursor,
            };
            let response = self.post("search", &body).await?;
            let result = extract_response_text(response).await?;
            parser::parse_search_pagination(result)
        })
        .await
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}

/// Turns an error status into an `Err` so that retry sees it.
fn ensure_success(result: ApiResponse<String>) -> Result<ApiResponse<String>, AppError> {
    if result.status.is_success() {
        Ok(result)
    } else {
        Err(parser::response_error(&result))
    }
}
