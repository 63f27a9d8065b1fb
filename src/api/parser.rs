// src/api/parser.rs
//! Turns raw HTTP responses into domain objects.
//!
//! Success bodies go through notion-client's serde types. Error bodies are
//! parsed as Notion error objects, falling back to the bare HTTP status.

use super::client::ApiResponse;
use super::notion_client_adapter::{
    convert_block, convert_database, convert_page, convert_search_result,
};
use super::responses::{NotionError, PaginatedResponse, WireUser};
use crate::error::{AppError, NotionClientError, NotionErrorCode};
use crate::model::{Block, Database, NotionObject, Page};
use serde_json::Value;

const BODY_PREVIEW_CHARS: usize = 500;

/// Parse any Notion API response, mapping error bodies to `AppError`.
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if result.status.is_success() {
        parse_success_body(&result.data, &result.url)
    } else {
        Err(response_error(&result))
    }
}

fn parse_success_body<T>(body: &str, url: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);
        NotionClientError::Deserialization {
            source: e,
            body: body.chars().take(BODY_PREVIEW_CHARS).collect(),
        }
        .into()
    })
}

/// Maps a non-success response to an error, preferring Notion's own error body.
pub fn response_error(result: &ApiResponse<String>) -> AppError {
    let status = result.status;
    if let Ok(notion_error) = serde_json::from_str::<NotionError>(&result.data) {
        return AppError::NotionService {
            code: NotionErrorCode::from_api_response(&notion_error.code),
            message: notion_error.message,
            status,
        };
    }

    AppError::NotionService {
        code: NotionErrorCode::from_http_status(status.as_u16()),
        message: format!("HTTP {} from {}", status, result.url),
        status,
    }
}

pub fn parse_page_response(result: ApiResponse<String>) -> Result<Page, AppError> {
    let raw: Value = parse_api_response(result)?;
    convert_page(&raw)
}

pub fn parse_database_response(result: ApiResponse<String>) -> Result<Database, AppError> {
    let raw: Value = parse_api_response(result)?;
    convert_database(&raw)
}

pub fn parse_block_response(result: ApiResponse<String>) -> Result<Block, AppError> {
    let raw: Value = parse_api_response(result)?;
    convert_block(&raw)
}

/// Returns the user's display name, or their id when the name is hidden.
pub fn parse_user_name(result: ApiResponse<String>) -> Result<String, AppError> {
    let user: WireUser = parse_api_response(result)?;
    Ok(user
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(user.id))
}

/// One page of a database query.
pub fn parse_pages_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Page>, AppError> {
    let response: PaginatedResponse<Value> = parse_api_response(result)?;
    let pages = convert_each(&response.results, "database row", convert_page);

    Ok(PaginatedResponse {
        object: response.object,
        results: pages,
        next_cursor: response.next_cursor,
        has_more: response.has_more,
    })
}

/// One page of a block's children.
pub fn parse_blocks_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Block>, AppError> {
    let response: PaginatedResponse<Value> = parse_api_response(result)?;
    let blocks = convert_each(&response.results, "block", convert_block);

    Ok(PaginatedResponse {
        object: response.object,
        results: blocks,
        next_cursor: response.next_cursor,
        has_more: response.has_more,
    })
}

/// Converts listing items one at a time, skipping any that fail.
fn convert_each<T>(
    items: &[Value],
    kind: &str,
    convert: impl Fn(&Value) -> Result<T, AppError>,
) -> Vec<T> {
    items
        .iter()
        .filter_map(|raw| match convert(raw) {
            Ok(item) => Some(item),
            Err(e) => {
                let id = raw.get("id").and_then(Value::as_str).unwrap_or("<unknown>");
                log::warn!("Skipping {} {}: {}", kind, id, e);
                None
            }
        })
        .collect()
}

/// One page of workspace search results.
///
/// Results that fail to convert are logged and skipped so that one odd
/// object does not hide the rest of the workspace.
pub fn parse_search_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<NotionObject>, AppError> {
    let response: PaginatedResponse<Value> = parse_api_response(result)?;
    let mut objects = Vec::with_capacity(response.results.len());

    for raw in &response.results {
        match convert_search_result(raw) {
            Ok(Some(object)) => objects.push(object),
            Ok(None) => {}
            Err(e) => {
                let id = raw.get("id").and_then(Value::as_str).unwrap_or("<unknown>");
                log::warn!("Skipping search result {}: {}", id, e);
            }
        }
    }

    Ok(PaginatedResponse {
        object: response.object,
        results: objects,
        next_cursor: response.next_cursor,
        has_more: response.has_more,
    })
}
