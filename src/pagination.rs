//! Pagination utilities for FOSSology list endpoints.
//!
//! List endpoints take `page` and `limit` and report the number of available
//! pages in the `X-Total-Pages` response header. [`paginate`] drives one or
//! all pages of such an endpoint and collects the items in server order.

use std::future::Future;

use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::error::{FossologyError, Result};

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Response header carrying the total number of pages.
pub const TOTAL_PAGES_HEADER: &str = "X-Total-Pages";

/// A page of results from the FOSSology API.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page (or on every fetched page).
    pub items: Vec<T>,
    /// Total number of pages reported by the server.
    pub total_pages: u32,
    /// First page fetched (1-indexed).
    pub page: u32,
    /// Number of items requested per page.
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Create a new page from items and pagination info.
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total_pages: u32) -> Self {
        Self {
            items,
            total_pages,
            page,
            page_size,
        }
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_pages: self.total_pages,
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// Keep only the items matching `predicate`.
    #[must_use]
    pub fn filter<P: FnMut(&T) -> bool>(mut self, predicate: P) -> Self {
        self.items.retain(predicate);
        self
    }

    /// Whether the server reports pages after this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Which page(s) of a list endpoint to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed). Ignored when `all_pages` is set.
    pub page: u32,
    /// Number of items per page.
    pub page_size: u32,
    /// Fetch every page starting from page 1.
    pub all_pages: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            all_pages: false,
        }
    }
}

impl PageRequest {
    /// Request a single page.
    #[must_use]
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            all_pages: false,
        }
    }

    /// Request every page.
    #[must_use]
    pub fn all(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            all_pages: true,
        }
    }

    /// Reject page numbers or sizes below 1.
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(FossologyError::InvalidArgument(
                "page must be at least 1".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(FossologyError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether this is the default single first page.
    pub(crate) fn is_default_window(&self) -> bool {
        !self.all_pages && self.page == 1 && self.page_size == DEFAULT_PAGE_SIZE
    }
}

/// One fetched page: its items and the server-reported page total.
#[derive(Debug, Clone)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
}

/// Read the total page count; a missing or non-numeric header means 0.
pub fn total_pages(headers: &HeaderMap) -> u32 {
    headers
        .get(TOTAL_PAGES_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

/// Drive a list endpoint according to `request`.
///
/// `fetch` is called with the page number to retrieve. Without `all_pages`
/// exactly one page is fetched. With `all_pages` pages 1, 2, ... are fetched
/// until the reported total is reached; a total of 0 ends the walk right
/// away. The first error aborts the walk and discards collected items.
pub async fn paginate<T, F, Fut>(request: &PageRequest, mut fetch: F) -> Result<Page<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PageResponse<T>>>,
{
    request.validate()?;

    if !request.all_pages {
        let response = fetch(request.page).await?;
        return Ok(Page::new(
            response.items,
            request.page,
            request.page_size,
            response.total_pages,
        ));
    }

    let mut items = Vec::new();
    let mut page = 1;
    // Assume a second page until the first response tells otherwise
    let mut total = 2;

    while page <= total {
        let response = fetch(page).await?;
        items.extend(response.items);
        total = response.total_pages;
        tracing::debug!(page, total_pages = total, "Fetched page");
        if total == 0 {
            break;
        }
        page += 1;
    }

    Ok(Page::new(items, 1, request.page_size, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use std::cell::RefCell;

    fn fake_pages(
        pages: Vec<Vec<i32>>,
        calls: &RefCell<Vec<u32>>,
    ) -> impl FnMut(u32) -> std::future::Ready<Result<PageResponse<i32>>> + '_ {
        move |page| {
            calls.borrow_mut().push(page);
            let total = pages.len() as u32;
            let items = pages.get(page as usize - 1).cloned().unwrap_or_default();
            std::future::ready(Ok(PageResponse {
                items,
                total_pages: total,
            }))
        }
    }

    #[test]
    fn test_page_has_more() {
        let page: Page<i32> = Page::new(vec![1; 100], 1, 100, 3);
        assert!(page.has_more());

        let page: Page<i32> = Page::new(vec![1; 50], 3, 100, 3);
        assert!(!page.has_more());
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 1, 100, 1);
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.page, 1);
    }

    #[test]
    fn test_total_pages_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(total_pages(&headers), 0);
        headers.insert(TOTAL_PAGES_HEADER, HeaderValue::from_static("4"));
        assert_eq!(total_pages(&headers), 4);
        headers.insert(TOTAL_PAGES_HEADER, HeaderValue::from_static("many"));
        assert_eq!(total_pages(&headers), 0);
    }

    #[test]
    fn test_invalid_requests_rejected() {
        assert!(PageRequest::page(0, 10).validate().is_err());
        assert!(PageRequest::page(1, 0).validate().is_err());
        assert!(PageRequest::default().validate().is_ok());
    }

    #[tokio::test]
    async fn test_all_pages_in_order() {
        let calls = RefCell::new(Vec::new());
        let fetch = fake_pages(vec![vec![1, 2], vec![3, 4], vec![5, 6]], &calls);

        let page = paginate(&PageRequest::all(2), fetch).await.unwrap();

        assert_eq!(page.items, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(*calls.borrow(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_single_page_only_fetches_requested_page() {
        let calls = RefCell::new(Vec::new());
        let fetch = fake_pages(vec![vec![1], vec![2], vec![3]], &calls);

        let page = paginate(&PageRequest::page(2, 1), fetch).await.unwrap();

        assert_eq!(page.items, vec![2]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(*calls.borrow(), vec![2]);
    }

    #[tokio::test]
    async fn test_zero_total_stops_after_first_request() {
        let calls = RefCell::new(Vec::new());
        let fetch = fake_pages(vec![], &calls);

        let page = paginate(&PageRequest::all(10), fetch).await.unwrap();

        assert!(page.is_empty());
        assert_eq!(page.total_pages, 0);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_error_discards_collected_items() {
        let mut calls = 0;
        let result: Result<Page<i32>> = paginate(&PageRequest::all(1), |page| {
            calls += 1;
            std::future::ready(if page == 2 {
                Err(FossologyError::Authorization {
                    description: format!("Unable to list items from page {page}"),
                    message: "denied".to_string(),
                    status_code: 403,
                })
            } else {
                Ok(PageResponse {
                    items: vec![page as i32],
                    total_pages: 3,
                })
            })
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("page 2"));
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_invalid_request_sends_nothing() {
        let mut calls = 0;
        let result: Result<Page<i32>> = paginate(&PageRequest::page(0, 10), |_| {
            calls += 1;
            std::future::ready(Ok(PageResponse {
                items: vec![],
                total_pages: 0,
            }))
        })
        .await;

        assert!(matches!(result, Err(FossologyError::InvalidArgument(_))));
        assert_eq!(calls, 0);
    }
}
