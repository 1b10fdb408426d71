use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Page, StoreApp, StoreCategory};

impl ApiClient {
    pub async fn get_store_app(&self, slug: &str) -> Result<StoreApp, Error> {
        self.get(&format!("api/store/apps/{slug}")).await
    }

    pub async fn list_store_categories(&self) -> Result<Vec<StoreCategory>, Error> {
        self.get_all("api/store/categories").await
    }

    /// One page of store search results.
    ///
    /// Search results are not cached, so pages are fetched on demand
    /// instead of being followed to the end.
    pub async fn search_store(
        &self,
        query: &str,
        category: Option<&str>,
        page: u32,
    ) -> Result<Page<StoreApp>, Error> {
        let mut params = vec![("query", query.to_owned()), ("page", page.to_string())];
        if let Some(category) = category {
            params.push(("category", category.to_owned()));
        }
        self.get_with_params("api/store/search", &params).await
    }
}
