use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

use super::traits::HttpClient;
use super::types::{ApiRequest, Method};
use crate::utils::{log_debug, ResourceError, Result};

/// reqwest-backed [`HttpClient`] rooted at a base URL
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RestClient {
    /// Create a new client with the given base URL and default timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
        })
    }

    /// Attach a bearer token to every request
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a request path against the base URL.
    /// Absolute URLs pass through untouched.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    fn build(&self, request: &ApiRequest) -> RequestBuilder {
        let url = self.resolve_url(&request.url);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };

        let query = request.params.to_query_pairs();
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        if request.method.has_body() {
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(token) = &self.auth_token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        builder
    }

    async fn send(&self, request: &ApiRequest) -> Result<Response> {
        log_debug(format!("{} {}", request.method, request.url));

        let response = self.build(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(ResourceError::Status { status, url, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl HttpClient for RestClient {
    async fn request(&self, request: ApiRequest) -> Result<Value> {
        let response = self.send(&request).await?;
        let bytes = response.bytes().await?;

        // DELETE and friends often answer 204 with an empty body
        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn request_bytes(&self, request: ApiRequest) -> Result<Bytes> {
        let response = self.send(&request).await?;
        Ok(response.bytes().await?)
    }
}
