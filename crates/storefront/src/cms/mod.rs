//! Read-only client for the headless CMS REST API.
//!
//! # Architecture
//!
//! - The CMS is the source of truth for the catalog - no local copies, no caching
//! - Every query is a single GET; there are no retries
//! - Failures are logged and degrade to "no data": list queries return an
//!   empty `Vec`, single-record queries return `None`
//!
//! Responses are JSON envelopes whose `data` field holds either an array of
//! records or a single record.
//!
//! # Example
//!
//! ```rust,ignore
//! use tienda_storefront::cms::CmsClient;
//!
//! let client = CmsClient::new(&config.cms)?;
//!
//! // Featured products for the home page
//! let featured = client.get_featured_products().await;
//!
//! // A single product page
//! if let Some(product) = client.get_product_by_slug("cafe-serrano").await {
//!     let image = client.media_url(product.primary_image().map(|m| m.url.as_str()));
//! }
//! ```

pub mod types;

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{CmsConfig, bearer_value};

pub use types::{
    Category, HeroSection, Media, PLACEHOLDER_IMAGE, Product, SocialMedia, StoreConfig, media_url,
};

const PRODUCTS: &str = "/api/products";
const CATEGORIES: &str = "/api/categories";
const STORE_CONFIG: &str = "/api/store-config";
const HERO_SECTION: &str = "/api/hero-section";

/// Errors that can occur when talking to the CMS.
#[derive(Debug, Error)]
pub enum CmsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CMS returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint could not be resolved against the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// API token cannot be sent as a header.
    #[error("Invalid API token format: {0}")]
    InvalidToken(String),
}

/// Client for the CMS read API.
///
/// Cheaply cloneable; clones share the underlying connection pool.
#[derive(Clone)]
pub struct CmsClient {
    inner: Arc<CmsClientInner>,
}

struct CmsClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl CmsClient {
    /// Create a new CMS client.
    ///
    /// # Errors
    ///
    /// Returns error if the API token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&bearer_value(token))
                .map_err(|e| CmsError::InvalidToken(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self::from_parts(client, config.base_url.clone()))
    }

    /// Create a client from a preconfigured HTTP client.
    #[must_use]
    pub fn from_parts(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            inner: Arc::new(CmsClientInner { client, base_url }),
        }
    }

    /// The base URL endpoints resolve against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve a media path against the base URL.
    #[must_use]
    pub fn media_url(&self, url: Option<&str>) -> String {
        media_url(&self.inner.base_url, url)
    }

    /// Build the request URL for an endpoint and its query parameters.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint cannot be joined to the base URL.
    pub fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, CmsError> {
        let mut url = self.inner.base_url.join(endpoint)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET an endpoint and parse the JSON body.
    ///
    /// # Errors
    ///
    /// Returns error on network failure, non-success status, or a body that
    /// is not JSON.
    pub async fn try_fetch(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, CmsError> {
        let url = self.endpoint_url(endpoint, params)?;
        debug!(url = %url, "CMS request");

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CmsError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// GET an endpoint, returning `None` on any failure.
    ///
    /// Failures are logged; callers treat `None` as "no data".
    pub async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Option<Value> {
        match self.try_fetch(endpoint, params).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(endpoint, error = %e, "CMS fetch failed");
                None
            }
        }
    }

    /// Fetch a collection, keeping the entries that `keep` accepts and that
    /// deserialize cleanly.
    async fn fetch_list<T, F>(&self, endpoint: &str, params: &[(&str, &str)], keep: F) -> Vec<T>
    where
        T: DeserializeOwned,
        F: Fn(&Value) -> bool,
    {
        let Some(Value::Array(entries)) = self
            .fetch(endpoint, params)
            .await
            .and_then(|mut body| body.get_mut("data").map(Value::take))
        else {
            return Vec::new();
        };

        entries
            .into_iter()
            .filter(|entry| keep(entry))
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(endpoint, error = %e, "Skipping malformed CMS record");
                    None
                }
            })
            .collect()
    }

    /// Fetch a collection and return its first entry.
    async fn fetch_first<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Option<T> {
        self.fetch_list(endpoint, params, |_| true).await.into_iter().next()
    }

    /// Fetch a single-type record.
    async fn fetch_single<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Option<T> {
        let data = self
            .fetch(endpoint, params)
            .await?
            .get_mut("data")
            .map(Value::take)
            .filter(|data| !data.is_null())?;

        serde_json::from_value(data)
            .map_err(|e| warn!(endpoint, error = %e, "Malformed CMS record"))
            .ok()
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get all products.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Vec<Product> {
        self.fetch_list(PRODUCTS, &[("populate", "*")], |_| true).await
    }

    /// Get featured products. Entries missing an ID or name are dropped.
    #[instrument(skip(self))]
    pub async fn get_featured_products(&self) -> Vec<Product> {
        self.fetch_list(
            PRODUCTS,
            &[("filters[featured][$eq]", "true"), ("populate", "*")],
            has_id_and_name,
        )
        .await
    }

    /// Get a product by its slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Option<Product> {
        self.fetch_first(PRODUCTS, &[("filters[slug][$eq]", slug), ("populate", "*")])
            .await
    }

    /// Get the products in a category.
    #[instrument(skip(self), fields(category = %category_slug))]
    pub async fn get_products_by_category(&self, category_slug: &str) -> Vec<Product> {
        self.fetch_list(
            PRODUCTS,
            &[
                ("filters[category][slug][$eq]", category_slug),
                ("populate", "*"),
            ],
            |_| true,
        )
        .await
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// Get all categories.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Vec<Category> {
        self.fetch_list(CATEGORIES, &[], |_| true).await
    }

    /// Get a category by its slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Option<Category> {
        self.fetch_first(CATEGORIES, &[("filters[slug][$eq]", slug)]).await
    }

    // =========================================================================
    // Single Types
    // =========================================================================

    /// Get the store configuration.
    #[instrument(skip(self))]
    pub async fn get_store_config(&self) -> Option<StoreConfig> {
        self.fetch_single(STORE_CONFIG, &[("populate", "*")]).await
    }

    /// Get the home page hero section.
    #[instrument(skip(self))]
    pub async fn get_hero_section(&self) -> Option<HeroSection> {
        self.fetch_single(HERO_SECTION, &[("populate", "images")]).await
    }
}

/// Whether both `id` and `name` are set to a non-falsy value (not `null`,
/// `false`, `0` or `""`).
fn has_id_and_name(entry: &Value) -> bool {
    let present = |key: &str| entry.get(key).is_some_and(is_truthy);
    present("id") && present("name")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::Query,
        http::StatusCode,
        response::IntoResponse,
        routing::get,
    };
    use serde_json::json;
    use tienda_core::ProductId;

    use super::*;

    async fn spawn_cms(router: Router) -> CmsClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        CmsClient::from_parts(http, Url::parse(&format!("http://{addr}")).unwrap())
    }

    fn product_json(id: i64, name: &str, slug: &str) -> Value {
        json!({"id": id, "name": name, "price": 10, "slug": slug})
    }

    async fn products(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let all = vec![
            product_json(1, "Café", "cafe"),
            product_json(2, "Pan", "pan"),
        ];
        let data: Vec<Value> = match params.get("filters[slug][$eq]") {
            Some(slug) => all.into_iter().filter(|p| p["slug"] == *slug).collect(),
            None => all,
        };
        Json(json!({ "data": data, "meta": {} }))
    }

    #[test]
    fn test_endpoint_url_encodes_filters() {
        let client = CmsClient::from_parts(
            reqwest::Client::new(),
            Url::parse("http://localhost:1337").unwrap(),
        );
        let url = client
            .endpoint_url(PRODUCTS, &[("filters[slug][$eq]", "café con leche"), ("populate", "*")])
            .unwrap();
        assert_eq!(url.path(), "/api/products");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("filters[slug][$eq]".to_string(), "café con leche".to_string()),
                ("populate".to_string(), "*".to_string()),
            ]
        );
    }

    #[test]
    fn test_has_id_and_name() {
        assert!(has_id_and_name(&json!({"id": 1, "name": "x"})));
        assert!(!has_id_and_name(&json!({"id": 1})));
        assert!(!has_id_and_name(&json!({"id": null, "name": "x"})));
        assert!(!has_id_and_name(&json!({"id": 1, "name": ""})));
    }

    #[test]
    fn test_has_id_and_name_rejects_falsy_ids() {
        assert!(!has_id_and_name(&json!({"id": 0, "name": "x"})));
        assert!(!has_id_and_name(&json!({"id": 0.0, "name": "x"})));
        assert!(!has_id_and_name(&json!({"id": false, "name": "x"})));
        assert!(!has_id_and_name(&json!({"id": 1, "name": false})));
        assert!(has_id_and_name(&json!({"id": -1, "name": "x"})));
        assert!(has_id_and_name(&json!({"id": "7", "name": "x"})));
    }

    #[tokio::test]
    async fn test_get_products() {
        let client = spawn_cms(Router::new().route(PRODUCTS, get(products))).await;
        let products = client.get_products().await;
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Café");
    }

    #[tokio::test]
    async fn test_get_product_by_slug() {
        let client = spawn_cms(Router::new().route(PRODUCTS, get(products))).await;

        let product = client.get_product_by_slug("pan").await.unwrap();
        assert_eq!(product.id, ProductId::new(2));

        assert!(client.get_product_by_slug("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_featured_products_drop_incomplete_entries() {
        let router = Router::new().route(
            PRODUCTS,
            get(|| async {
                Json(json!({"data": [
                    {"id": 1, "name": "Café", "price": 10, "slug": "cafe", "featured": true},
                    {"id": 2, "price": 10, "slug": "no-name", "featured": true},
                    {"id": 3, "name": "Broken", "price": "abc", "slug": "broken"}
                ]}))
            }),
        );
        let client = spawn_cms(router).await;

        let featured = client.get_featured_products().await;
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].slug, "cafe");
    }

    #[tokio::test]
    async fn test_server_error_degrades_to_empty() {
        let router = Router::new()
            .route(
                PRODUCTS,
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }),
            )
            .route(STORE_CONFIG, get(|| async { "not json" }));
        let client = spawn_cms(router).await;

        assert!(client.get_products().await.is_empty());
        assert!(client.get_store_config().await.is_none());
        assert!(matches!(
            client.try_fetch(PRODUCTS, &[]).await,
            Err(CmsError::Api { status: 500, .. })
        ));
        assert!(matches!(
            client.try_fetch(STORE_CONFIG, &[]).await,
            Err(CmsError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_cms_degrades_to_empty() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let client = CmsClient::from_parts(http, Url::parse(&format!("http://{addr}")).unwrap());

        assert!(client.fetch(PRODUCTS, &[]).await.is_none());
        assert!(client.get_categories().await.is_empty());
    }

    #[tokio::test]
    async fn test_single_types() {
        let router = Router::new()
            .route(
                STORE_CONFIG,
                get(|| async {
                    Json(json!({"data": {
                        "id": 1,
                        "storeName": "La Bodega",
                        "whatsappNumber": "5355550000"
                    }}))
                }),
            )
            .route(
                HERO_SECTION,
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(params.get("populate").map(String::as_str), Some("images"));
                    let images = json!([{"id": 5, "url": "/uploads/hero.jpg"}]);
                    Json(json!({"data": {"id": 1, "images": images}}))
                }),
            );
        let client = spawn_cms(router).await;

        let config = client.get_store_config().await.unwrap();
        assert_eq!(config.store_name, "La Bodega");

        let hero = client.get_hero_section().await.unwrap();
        assert_eq!(hero.images.len(), 1);
        assert!(client.media_url(Some(&hero.images[0].url)).ends_with("/uploads/hero.jpg"));
    }

    #[tokio::test]
    async fn test_null_single_type_is_none() {
        let router =
            Router::new().route(HERO_SECTION, get(|| async { Json(json!({"data": null})) }));
        let client = spawn_cms(router).await;
        assert!(client.get_hero_section().await.is_none());
    }

    #[tokio::test]
    async fn test_category_queries() {
        let router = Router::new()
            .route(
                CATEGORIES,
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let all = vec![
                        json!({"id": 1, "name": "Bebidas", "slug": "bebidas"}),
                        json!({"id": 2, "name": "Dulces", "slug": "dulces"}),
                    ];
                    let data: Vec<Value> = match params.get("filters[slug][$eq]") {
                        Some(slug) => all.into_iter().filter(|c| c["slug"] == *slug).collect(),
                        None => all,
                    };
                    Json(json!({ "data": data }))
                }),
            )
            .route(
                PRODUCTS,
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(
                        params.get("filters[category][slug][$eq]").map(String::as_str),
                        Some("bebidas")
                    );
                    Json(json!({"data": [product_json(1, "Café", "cafe")]}))
                }),
            );
        let client = spawn_cms(router).await;

        assert_eq!(client.get_categories().await.len(), 2);
        assert_eq!(
            client.get_category_by_slug("dulces").await.unwrap().name,
            "Dulces"
        );
        assert_eq!(client.get_products_by_category("bebidas").await.len(), 1);
    }
}
