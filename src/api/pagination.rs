// src/api/pagination.rs
//! Cursor pagination where each page of results is retried on its own.

use super::responses::PaginatedResponse;
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;
use crate::error_recovery::{retry_linear, RetryPolicy};

/// Fetches every page of a cursor-paginated listing.
///
/// A failed page is retried under `policy` with the same cursor, so a
/// transient error halfway through a long listing does not restart it.
pub async fn fetch_all_pages<T, F, Fut>(
    policy: RetryPolicy,
    description: &str,
    mut fetch_fn: F,
) -> Result<Vec<T>, AppError>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages_fetched = 0u32;

    loop {
        let page_description = format!("{} (page {})", description, pages_fetched + 1);
        let response = retry_linear(policy, &page_description, || {
            fetch_fn(NOTION_API_PAGE_SIZE, cursor.clone())
        })
        .await?;

        pages_fetched += 1;
        all_items.extend(response.results);
        cursor = response.next_cursor;

        if !response.has_more || cursor.is_none() {
            break;
        }
    }

    log::debug!(
        "{}: {} items in {} page(s)",
        description,
        all_items.len(),
        pages_fetched
    );
    Ok(all_items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn page(results: Vec<u32>, next: Option<&str>) -> PaginatedResponse<u32> {
        PaginatedResponse {
            object: "list".to_string(),
            results,
            next_cursor: next.map(str::to_string),
            has_more: next.is_some(),
        }
    }

    #[tokio::test]
    async fn test_follows_cursors_until_exhausted() {
        let seen = RefCell::new(Vec::new());
        let items = fetch_all_pages(fast_policy(), "numbers", |size, cursor| {
            seen.borrow_mut().push(cursor.clone());
            assert_eq!(size, NOTION_API_PAGE_SIZE);
            async move {
                Ok(match cursor.as_deref() {
                    None => page(vec![1, 2], Some("c1")),
                    Some("c1") => page(vec![3], Some("c2")),
                    _ => page(vec![4], None),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(
            *seen.borrow(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failed_page_is_retried_with_same_cursor() {
        let calls = RefCell::new(Vec::new());
        let items = fetch_all_pages(fast_policy(), "flaky", |_, cursor| {
            calls.borrow_mut().push(cursor.clone());
            let attempt = calls.borrow().len();
            async move {
                match (cursor.as_deref(), attempt) {
                    (None, _) => Ok(page(vec![1], Some("next"))),
                    (Some("next"), 2) => Err(AppError::MalformedResponse("timeout".into())),
                    _ => Ok(page(vec![2], None)),
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2]);
        assert_eq!(
            *calls.borrow(),
            vec![None, Some("next".to_string()), Some("next".to_string())]
        );
    }

    #[tokio::test]
    async fn test_persistent_failure_propagates() {
        let result: Result<Vec<u32>, _> = fetch_all_pages(fast_policy(), "broken", |_, _| async {
            Err(AppError::MalformedResponse("down".into()))
        })
        .await;
        assert!(result.is_err());
    }
}
