//! HTTP session against the monitoring backend REST API.
//!
//! The backend exposes Eve-style resources: `POST /login` yields a token,
//! `GET /<resource>` accepts `sort`, `where`, `projection` and `embedded`
//! query parameters (the last three JSON-encoded) and answers with an
//! `_items` array plus `_links` pagination hints.
//!
//! ## Example
//!
//! ```rust,no_run
//! use counterwatch::backend::{BackendSession, ResourceQuery};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = BackendSession::builder()
//!         .endpoint("http://127.0.0.1:5000")
//!         .credentials("admin", "admin")
//!         .build();
//!     session.login().await?;
//!
//!     let query = ResourceQuery::new()
//!         .sort("-last_check")
//!         .projection(json!({"host_name": 1, "perf_data": 1}));
//!     let records: Vec<Value> = session.get_all("logcheckresult", &query).await?;
//!     println!("fetched {} records", records.len());
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::BackendError;

/// Items requested per page when walking a paginated resource.
const DEFAULT_PAGE_SIZE: usize = 50;

/// Authenticated session against one backend instance.
#[derive(Debug, Clone)]
pub struct BackendSession {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
    token: Option<String>,
    page_size: usize,
}

impl BackendSession {
    /// Create a new builder for configuring the session.
    pub fn builder() -> BackendSessionBuilder {
        BackendSessionBuilder::default()
    }

    /// Log in and store the session token.
    ///
    /// The backend may answer a successful login with a null token; that is
    /// still an access denial.
    pub async fn login(&mut self) -> Result<(), BackendError> {
        let url = format!("{}/login", self.endpoint);
        debug!("logging in to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
                "action": "generate",
            }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BackendError::Auth("invalid credentials".to_string()));
        }
        if !response.status().is_success() {
            return Err(BackendError::Status {
                status: response.status().as_u16(),
                resource: "login".to_string(),
            });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        match body.token {
            Some(token) if !token.is_empty() => {
                self.token = Some(token);
                Ok(())
            }
            _ => Err(BackendError::Auth("access is denied".to_string())),
        }
    }

    /// Whether `login` has succeeded on this session.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Fetch a single page of a resource.
    pub async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &ResourceQuery,
    ) -> Result<Page<T>, BackendError> {
        self.get_page(resource, query, None).await
    }

    /// Fetch every page of a resource, concatenating the `_items` arrays.
    pub async fn get_all<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &ResourceQuery,
    ) -> Result<Vec<T>, BackendError> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let fetched = self.get_page::<T>(resource, query, Some(page)).await?;
            let has_next = fetched.has_next;
            items.extend(fetched.items);
            if !has_next {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &ResourceQuery,
        page: Option<usize>,
    ) -> Result<Page<T>, BackendError> {
        let url = format!("{}/{}", self.endpoint, resource);
        let mut request = self.client.get(&url).query(&query.params());
        if let Some(page) = page {
            request = request.query(&[
                ("page", page.to_string()),
                ("max_results", self.page_size.to_string()),
            ]);
        }
        if let Some(token) = &self.token {
            request = request.basic_auth(token, Some(""));
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BackendError::Auth("token rejected".to_string()));
        }
        if !response.status().is_success() {
            return Err(BackendError::Status {
                status: response.status().as_u16(),
                resource: resource.to_string(),
            });
        }

        let body: ItemsPage<T> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(Page {
            items: body.items,
            has_next: body.links.is_some_and(|l| l.next.is_some()),
        })
    }
}

/// Builder for [`BackendSession`].
#[derive(Debug, Default)]
pub struct BackendSessionBuilder {
    endpoint: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
    page_size: Option<usize>,
}

impl BackendSessionBuilder {
    /// Set the backend root URL (e.g. "http://127.0.0.1:5000").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        self
    }

    /// Set the login credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the page size used by `get_all` (default: 50).
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Build the session. No network activity happens until `login`.
    pub fn build(self) -> BackendSession {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        BackendSession {
            client,
            endpoint: self
                .endpoint
                .unwrap_or_else(|| "http://127.0.0.1:5000".to_string()),
            username: self.username.unwrap_or_else(|| "admin".to_string()),
            password: self.password.unwrap_or_else(|| "admin".to_string()),
            token: None,
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

/// One page of a resource listing.
#[derive(Debug)]
pub struct Page<T> {
    /// The page's `_items`.
    pub items: Vec<T>,
    /// Whether the backend advertised a next page.
    pub has_next: bool,
}

/// Query parameters accepted by the backend's GET endpoints.
///
/// `where`, `projection` and `embedded` are JSON documents on the wire;
/// they are kept as [`Value`]s here and encoded when the request is built.
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    sort: Option<String>,
    filter: Option<Value>,
    projection: Option<Value>,
    embedded: Option<Value>,
}

impl ResourceQuery {
    /// Create an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort specification, e.g. "-last_check" or "name".
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// The `where` filter document.
    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Field selection document.
    pub fn projection(mut self, projection: Value) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Related-resource inclusion document.
    pub fn embedded(mut self, embedded: Value) -> Self {
        self.embedded = Some(embedded);
        self
    }

    /// Encode as query-string pairs.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(filter) = &self.filter {
            params.push(("where", filter.to_string()));
        }
        if let Some(projection) = &self.projection {
            params.push(("projection", projection.to_string()));
        }
        if let Some(embedded) = &self.embedded {
            params.push(("embedded", embedded.to_string()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsPage<T> {
    #[serde(rename = "_items", default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "_links", default)]
    links: Option<PageLinks>,
}

#[derive(Debug, Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<PageLink>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    #[allow(dead_code)]
    href: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_defaults() {
        let session = BackendSession::builder().build();
        assert_eq!(session.endpoint, "http://127.0.0.1:5000");
        assert_eq!(session.username, "admin");
        assert_eq!(session.password, "admin");
        assert_eq!(session.page_size, DEFAULT_PAGE_SIZE);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn builder_custom() {
        let session = BackendSession::builder()
            .endpoint("http://backend.local:5000/")
            .credentials("operator", "secret")
            .page_size(10)
            .build();

        assert_eq!(session.endpoint, "http://backend.local:5000");
        assert_eq!(session.username, "operator");
        assert_eq!(session.password, "secret");
        assert_eq!(session.page_size, 10);
    }

    #[test]
    fn query_params_encoding() {
        let query = ResourceQuery::new()
            .sort("-last_check")
            .filter(json!({"service": "s1"}))
            .projection(json!({"name": 1}));

        let params = query.params();
        assert_eq!(
            params,
            vec![
                ("sort", "-last_check".to_string()),
                ("where", r#"{"service":"s1"}"#.to_string()),
                ("projection", r#"{"name":1}"#.to_string()),
            ]
        );
    }

    #[test]
    fn empty_query_has_no_params() {
        assert!(ResourceQuery::new().params().is_empty());
    }

    #[test]
    fn items_page_tolerates_missing_fields() {
        let page: ItemsPage<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
        assert!(page.links.is_none());

        let page: ItemsPage<serde_json::Value> = serde_json::from_str(
            r#"{"_items": [{"a": 1}], "_links": {"next": {"href": "r?page=2"}}}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.links.unwrap().next.is_some());
    }
}
