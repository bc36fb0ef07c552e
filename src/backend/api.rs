//! HTTP client for the storefront REST API

use async_trait::async_trait;
use reqwest::{Client, Request};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::{Category, SearchResultPage};
use super::{CategoryProvider, SearchProvider};
use crate::error::SearchError;

/// Client for communicating with the Express storefront backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
}

/// Controllers answer either with the bare payload or wrapped in `{ "data": ... }`
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(inner) => inner,
        }
    }
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn categories_request(&self) -> Result<Request, SearchError> {
        let url = format!("{}/api/v1/category", self.base_url);
        Ok(self.client.get(url).build()?)
    }

    fn search_request(
        &self,
        term: &str,
        category_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<Request, SearchError> {
        let url = format!("{}/api/v1/product/search", self.base_url);
        let request = self
            .client
            .get(url)
            .query(&[
                ("key", term.to_string()),
                ("categoryId", category_id.to_string()),
                ("page", page.to_string()),
                ("pageSize", page_size.to_string()),
            ])
            .build()?;
        Ok(request)
    }

    /// Check if backend is healthy
    pub async fn health_check(&self) -> Result<HealthResponse, SearchError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl CategoryProvider for BackendClient {
    async fn list_categories(&self) -> Result<Vec<Category>, SearchError> {
        let request = self.categories_request()?;
        tracing::debug!("GET {}", request.url());
        let response = self.client.execute(request).await?;
        decode::<Envelope<Vec<Category>>>(response)
            .await
            .map(Envelope::into_inner)
    }
}

#[async_trait]
impl SearchProvider for BackendClient {
    async fn search_products(
        &self,
        term: &str,
        category_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<SearchResultPage, SearchError> {
        let request = self.search_request(term, category_id, page, page_size)?;
        tracing::debug!("GET {}", request.url());
        let response = self.client.execute(request).await?;
        decode::<Envelope<SearchResultPage>>(response)
            .await
            .map(Envelope::into_inner)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SearchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Status(status.as_u16()));
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| SearchError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_accepts_wrapped_and_bare_pages() {
        let wrapped: Envelope<SearchResultPage> = serde_json::from_str(
            r#"{"data":{"total":1,"products":[{"id":1,"name":"Tire","price":"10"}]}}"#,
        )
        .unwrap();
        let page = wrapped.into_inner();
        assert_eq!(page.total, 1);
        assert_eq!(page.products[0].name, "Tire");

        let bare: Envelope<SearchResultPage> =
            serde_json::from_str(r#"{"total":0,"products":[]}"#).unwrap();
        assert_eq!(bare.into_inner(), SearchResultPage::default());
    }

    #[test]
    fn test_envelope_accepts_bare_category_list() {
        let categories: Envelope<Vec<Category>> =
            serde_json::from_str(r#"[{"id":1,"name":"Engine"},{"id":2,"name":"Body"}]"#).unwrap();
        assert_eq!(categories.into_inner().len(), 2);
    }

    #[test]
    fn test_search_request_url() {
        let client = BackendClient::new("http://shop.local/");
        let request = client.search_request("đèn & còi", 3, 1, 6).unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/api/v1/product/search");
        assert_eq!(
            request.url().query(),
            Some("key=%C4%91%C3%A8n+%26+c%C3%B2i&categoryId=3&page=1&pageSize=6")
        );

        let key = request
            .url()
            .query_pairs()
            .find(|(k, _)| k == "key")
            .map(|(_, v)| v.into_owned());
        assert_eq!(key.as_deref(), Some("đèn & còi"));
    }

    #[test]
    fn test_categories_request_url() {
        let client = BackendClient::new("http://shop.local");
        let request = client.categories_request().unwrap();
        assert_eq!(request.url().as_str(), "http://shop.local/api/v1/category");
    }

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        let response = http::Response::builder()
            .status(status)
            .body(body)
            .unwrap();
        reqwest::Response::from(response)
    }

    #[tokio::test]
    async fn test_decode_maps_error_status() {
        let result = decode::<SearchResultPage>(response(502, "Bad Gateway")).await;
        assert_eq!(result, Err(SearchError::Status(502)));

        let result = decode::<Vec<Category>>(response(404, "")).await;
        assert_eq!(result, Err(SearchError::Status(404)));
    }

    #[tokio::test]
    async fn test_decode_rejects_non_json_body() {
        let result = decode::<SearchResultPage>(response(200, "<html>maintenance</html>")).await;
        assert!(matches!(result, Err(SearchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_decode_success_body() {
        let body = r#"{"data":{"total":2,"products":[{"id":3,"name":"Horn","price":"50000"}]}}"#;
        let page = decode::<Envelope<SearchResultPage>>(response(200, body))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(page.total, 2);
        assert_eq!(page.products[0].price, 50000.0);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = BackendClient::new("http://127.0.0.1:8080/");
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }
}
