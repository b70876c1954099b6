//! List trait for fetching collections of entities.

use async_trait::async_trait;

use crate::client::FossologyClient;
use crate::error::Result;
use crate::pagination::{paginate, Page, PageRequest, PageResponse, DEFAULT_PAGE_SIZE};

/// List/filter entities with pagination support.
///
/// Implementors provide [`List::list_page`]; [`List::list`] drives it
/// through [`paginate`] for one or all pages.
///
/// # Example
///
/// ```ignore
/// use fossology::{FossologyClient, Job, List, PageRequest};
///
/// let client = FossologyClient::from_env()?;
///
/// // Fetch a single page
/// let page = Job::list(&client, &Default::default(), &PageRequest::page(1, 50)).await?;
///
/// // Fetch all pages
/// let all_jobs = Job::list_all(&client, &Default::default()).await?;
/// ```
#[async_trait]
pub trait List: Sized + Send {
    /// Filters for the listing.
    type Query: Default + Send + Sync;

    /// Fetch one page.
    ///
    /// # Arguments
    ///
    /// * `client` - The FOSSology API client
    /// * `query` - Filters
    /// * `page` - Page number (1-indexed)
    /// * `page_size` - Number of items per page
    ///
    /// # Errors
    ///
    /// Returns an error naming `page` if the request fails.
    async fn list_page(
        client: &FossologyClient,
        query: &Self::Query,
        page: u32,
        page_size: u32,
    ) -> Result<PageResponse<Self>>;

    /// Fetch the page(s) selected by `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or any page fails; no
    /// partial results are returned.
    async fn list(
        client: &FossologyClient,
        query: &Self::Query,
        request: &PageRequest,
    ) -> Result<Page<Self>> {
        let page_size = request.page_size;
        paginate(request, |page| Self::list_page(client, query, page, page_size)).await
    }

    /// Fetch every page with the default page size.
    async fn list_all(client: &FossologyClient, query: &Self::Query) -> Result<Vec<Self>> {
        let page = Self::list(client, query, &PageRequest::all(DEFAULT_PAGE_SIZE)).await?;
        Ok(page.items)
    }
}
