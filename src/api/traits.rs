use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::types::ApiRequest;
use crate::utils::Result;

/// HTTP capability the resource layer is built on.
///
/// Implementations perform the request and return the parsed JSON body, or
/// fail with transport / status detail. They own timeouts and auth headers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a request and parse the response body as JSON
    async fn request(&self, request: ApiRequest) -> Result<Value>;

    /// Perform a request and return the raw response body
    async fn request_bytes(&self, request: ApiRequest) -> Result<Bytes>;
}
