//! Storefront backend: provider contracts and their HTTP implementation

pub mod api;
pub mod types;

use async_trait::async_trait;

use crate::error::SearchError;
use types::{Category, SearchResultPage};

/// Read-only category lookup
#[async_trait]
pub trait CategoryProvider: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, SearchError>;
}

/// Paginated product search. Implementations must be idempotent.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search_products(
        &self,
        term: &str,
        category_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResultPage, SearchError>;
}
