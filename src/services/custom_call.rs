use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{HttpClient, Method, Params};
use crate::resources::{CustomRequest, ResourceManager};
use crate::utils::Result;

/// Shared helper every domain endpoint is built on.
///
/// Delegates to [`ResourceManager::custom_call`] with the manager's default
/// client injected.
#[derive(Clone)]
pub struct CustomCall {
    manager: Arc<ResourceManager>,
    api: Arc<dyn HttpClient>,
}

impl CustomCall {
    pub fn new(manager: Arc<ResourceManager>) -> Self {
        let api = manager.default_api();
        Self { manager, api }
    }

    pub fn manager(&self) -> &Arc<ResourceManager> {
        &self.manager
    }

    pub async fn call(
        &self,
        url: &str,
        method: Method,
        data: Option<Value>,
        params: Params,
        use_cache: bool,
        cache_duration: Option<Duration>,
    ) -> Result<Value> {
        self.manager
            .custom_call(CustomRequest {
                url: url.to_string(),
                method,
                data,
                params,
                api: Some(self.api.clone()),
                use_cache,
                cache_duration,
            })
            .await
    }

    /// Uncached GET
    pub async fn get(&self, url: &str, params: Params) -> Result<Value> {
        self.call(url, Method::Get, None, params, false, None).await
    }

    /// Cached GET; `None` uses the manager's global ttl
    pub async fn get_cached(&self, url: &str, params: Params, ttl: Option<Duration>) -> Result<Value> {
        self.call(url, Method::Get, None, params, true, ttl).await
    }

    pub async fn post(&self, url: &str, data: Option<Value>) -> Result<Value> {
        self.call(url, Method::Post, data, Params::new(), false, None)
            .await
    }

    pub async fn put(&self, url: &str, data: Option<Value>) -> Result<Value> {
        self.call(url, Method::Put, data, Params::new(), false, None)
            .await
    }

    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.call(url, Method::Delete, None, Params::new(), false, None)
            .await
    }
}
