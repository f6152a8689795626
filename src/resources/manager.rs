use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::config::ResourceConfig;
use crate::api::{ApiRequest, HttpClient, Method, Params, ResourceId};
use crate::cache::{
    generate_key, item_key, CacheEntryInfo, CacheStats, CacheStore, Clock, SystemClock,
};
use crate::constants::{DEFAULT_BASE_PATH, MANAGER_DEFAULT_CACHE_MS};
use crate::utils::{log_debug, log_error, log_info, log_warn, ResourceError, Result};

/// A free-form request for [`ResourceManager::custom_call`]
#[derive(Clone, Default)]
pub struct CustomRequest {
    pub url: String,
    pub method: Method,
    pub data: Option<Value>,
    pub params: Params,
    /// Client to use instead of the manager default
    pub api: Option<Arc<dyn HttpClient>>,
    /// Only honoured for GET
    pub use_cache: bool,
    pub cache_duration: Option<Duration>,
}

impl CustomRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn api(mut self, api: Arc<dyn HttpClient>) -> Self {
        self.api = Some(api);
        self
    }

    /// Cache a GET response, for `duration` or the global default
    pub fn cached(mut self, duration: Option<Duration>) -> Self {
        self.use_cache = true;
        self.cache_duration = duration;
        self
    }
}

/// Owns the response cache and per-resource configuration and performs all
/// CRUD traffic for the service layer.
///
/// Build one per process (or per test) and share it behind an `Arc`. Locks
/// are never held across a request, so concurrent reads of the same key are
/// not coalesced: each issues its own request and the last write wins.
pub struct ResourceManager {
    default_api: Arc<dyn HttpClient>,
    cache: Mutex<CacheStore>,
    configs: RwLock<HashMap<String, ResourceConfig>>,
    global_cache_duration: RwLock<Duration>,
}

impl ResourceManager {
    pub fn new(default_api: Arc<dyn HttpClient>) -> Self {
        Self::with_clock(default_api, Arc::new(SystemClock))
    }

    pub fn with_clock(default_api: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Self {
        Self {
            default_api,
            cache: Mutex::new(CacheStore::with_clock(clock)),
            configs: RwLock::new(HashMap::new()),
            global_cache_duration: RwLock::new(Duration::from_millis(MANAGER_DEFAULT_CACHE_MS)),
        }
    }

    pub fn default_api(&self) -> Arc<dyn HttpClient> {
        self.default_api.clone()
    }

    // ---- configuration ----

    pub fn set_resource_config(&self, resource_type: &str, config: ResourceConfig) {
        self.configs.write().insert(resource_type.to_string(), config);
    }

    /// Config for a resource type, or an empty one when unset
    pub fn resource_config(&self, resource_type: &str) -> ResourceConfig {
        self.configs
            .read()
            .get(resource_type)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_resource_config(&self, resource_type: &str) -> bool {
        self.configs.read().contains_key(resource_type)
    }

    /// Registered resource types, sorted
    pub fn resource_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.configs.read().keys().cloned().collect();
        types.sort();
        types
    }

    pub fn set_global_cache_duration(&self, duration: Duration) {
        *self.global_cache_duration.write() = duration;
    }

    pub fn global_cache_duration(&self) -> Duration {
        *self.global_cache_duration.read()
    }

    /// Change the ttl of an already registered resource type.
    ///
    /// Returns `false` (and logs a warning) when the type has no config; this
    /// never creates one.
    pub fn set_resource_cache_duration(&self, resource_type: &str, duration: Duration) -> bool {
        let mut configs = self.configs.write();
        match configs.get_mut(resource_type) {
            Some(config) => {
                config.cache_duration = Some(duration);
                log_info(
                    "⏱️",
                    format!("Cache duration for {} set to {}ms", resource_type, duration.as_millis()),
                );
                true
            }
            None => {
                log_warn(
                    "⚠️",
                    format!("No config registered for {}, cache duration unchanged", resource_type),
                );
                false
            }
        }
    }

    /// Effective ttl: resource override, else global default
    pub fn resolve_cache_duration(&self, resource_type: &str) -> Duration {
        self.resource_config(resource_type)
            .cache_duration()
            .unwrap_or_else(|| self.global_cache_duration())
    }

    fn api_for(&self, config: &ResourceConfig) -> Arc<dyn HttpClient> {
        config.api.clone().unwrap_or_else(|| self.default_api.clone())
    }

    fn collection_url(config: &ResourceConfig, resource_type: &str) -> String {
        let base_path = config.base_path().unwrap_or(DEFAULT_BASE_PATH);
        format!("{}/{}/", base_path, resource_type)
    }

    fn item_url(config: &ResourceConfig, resource_type: &str, id: &ResourceId) -> String {
        let base_path = config.base_path().unwrap_or(DEFAULT_BASE_PATH);
        format!("{}/{}/{}/", base_path, resource_type, id)
    }

    // ---- reads ----

    /// Fetch a collection, normalized into a list
    pub async fn get_list(
        &self,
        resource_type: &str,
        params: &Params,
        force_refresh: bool,
    ) -> Result<Vec<Value>> {
        let key = generate_key(resource_type, params);
        let config = self.resource_config(resource_type);
        let ttl = config
            .cache_duration()
            .unwrap_or_else(|| self.global_cache_duration());

        if !force_refresh {
            if let Some(cached) = self.cached(&key) {
                return Ok(into_list(cached));
            }
        }

        let url = Self::collection_url(&config, resource_type);
        let request = ApiRequest::get(url).with_params(params.clone());

        match self.api_for(&config).request(request).await {
            Ok(body) => {
                let items = normalize_list(body);
                self.cache
                    .lock()
                    .set(key, Value::Array(items.clone()), ttl);
                Ok(items)
            }
            Err(err) => {
                log_error("❌", format!("Failed to fetch {} list: {}", resource_type, err));
                self.rescue(&key, err).map(into_list)
            }
        }
    }

    /// Fetch a single item, body returned as-is
    pub async fn get_by_id(
        &self,
        resource_type: &str,
        id: impl Into<ResourceId>,
        force_refresh: bool,
    ) -> Result<Value> {
        let id = id.into();
        let key = item_key(resource_type, &id);
        let config = self.resource_config(resource_type);
        let ttl = config
            .cache_duration()
            .unwrap_or_else(|| self.global_cache_duration());

        if !force_refresh {
            if let Some(cached) = self.cached(&key) {
                return Ok(cached);
            }
        }

        let url = Self::item_url(&config, resource_type, &id);

        match self.api_for(&config).request(ApiRequest::get(url)).await {
            Ok(body) => {
                self.cache.lock().set(key, body.clone(), ttl);
                Ok(body)
            }
            Err(err) => {
                log_error("❌", format!("Failed to fetch {}/{}: {}", resource_type, id, err));
                self.rescue(&key, err)
            }
        }
    }

    // ---- writes ----

    pub async fn create(&self, resource_type: &str, data: Value) -> Result<Value> {
        let config = self.resource_config(resource_type);
        let url = Self::collection_url(&config, resource_type);
        let request = ApiRequest::new(Method::Post, url).with_body(Some(data));

        let body = self.api_for(&config).request(request).await?;
        self.invalidate_cache(resource_type);
        Ok(body)
    }

    pub async fn update(
        &self,
        resource_type: &str,
        id: impl Into<ResourceId>,
        data: Value,
    ) -> Result<Value> {
        self.write_item(Method::Put, resource_type, id.into(), Some(data))
            .await
    }

    pub async fn patch(
        &self,
        resource_type: &str,
        id: impl Into<ResourceId>,
        data: Value,
    ) -> Result<Value> {
        self.write_item(Method::Patch, resource_type, id.into(), Some(data))
            .await
    }

    pub async fn delete(&self, resource_type: &str, id: impl Into<ResourceId>) -> Result<()> {
        self.write_item(Method::Delete, resource_type, id.into(), None)
            .await
            .map(|_| ())
    }

    async fn write_item(
        &self,
        method: Method,
        resource_type: &str,
        id: ResourceId,
        data: Option<Value>,
    ) -> Result<Value> {
        let config = self.resource_config(resource_type);
        let url = Self::item_url(&config, resource_type, &id);
        let request = ApiRequest::new(method, url).with_body(data);

        let body = self.api_for(&config).request(request).await?;
        self.invalidate_cache(&item_key(resource_type, &id));
        self.invalidate_cache(resource_type);
        Ok(body)
    }

    // ---- escape hatch ----

    /// Arbitrary request. Only a GET with `use_cache` set touches the cache.
    pub async fn custom_call(&self, request: CustomRequest) -> Result<Value> {
        let CustomRequest {
            url,
            method,
            data,
            params,
            api,
            use_cache,
            cache_duration,
        } = request;
        let api = api.unwrap_or_else(|| self.default_api.clone());

        if method != Method::Get || !use_cache {
            let request = ApiRequest::new(method, url)
                .with_params(params)
                .with_body(data);
            return api.request(request).await;
        }

        let key = generate_key(&url, &params);
        let ttl = cache_duration
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| self.global_cache_duration());

        if let Some(cached) = self.cached(&key) {
            return Ok(cached);
        }

        match api.request(ApiRequest::get(&url).with_params(params)).await {
            Ok(body) => {
                self.cache.lock().set(key, body.clone(), ttl);
                Ok(body)
            }
            Err(err) => {
                log_error("❌", format!("Custom call to {} failed: {}", url, err));
                self.rescue(&key, err)
            }
        }
    }

    // ---- cache management ----

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
        log_info("🧹", "Resource cache cleared");
    }

    /// Drop every entry whose key starts with `prefix`
    pub fn invalidate_cache(&self, prefix: &str) -> usize {
        let removed = self.cache.lock().remove_prefix(prefix);
        if removed > 0 {
            log_debug(format!("Invalidated {} cache entries for '{}'", removed, prefix));
        }
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    pub fn cache_keys(&self) -> Vec<String> {
        self.cache.lock().keys()
    }

    pub fn cache_entries(&self) -> Vec<CacheEntryInfo> {
        self.cache.lock().entries()
    }

    fn cached(&self, key: &str) -> Option<Value> {
        let hit = self.cache.lock().get(key, false);
        if hit.is_some() {
            log_debug(format!("Cache hit: {}", key));
        }
        hit
    }

    /// Serve an expired entry in place of a failed request, if one exists
    fn rescue(&self, key: &str, err: ResourceError) -> Result<Value> {
        match self.cache.lock().get(key, true) {
            Some(stale) => {
                log_warn("🕰️", format!("Serving stale cache for {}", key));
                Ok(stale)
            }
            None => Err(err),
        }
    }
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("cache", &*self.cache.lock())
            .field("resource_types", &self.resource_types())
            .field("global_cache_duration", &self.global_cache_duration())
            .finish()
    }
}

/// `results` array, else the body if it is an array, else `[body]`
pub fn normalize_list(body: Value) -> Vec<Value> {
    match body {
        Value::Object(mut map) if matches!(map.get("results"), Some(Value::Array(_))) => {
            match map.remove("results") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}
