use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::api::HttpClient;

/// Per-resource-type overrides. Unset fields fall back to manager defaults.
#[derive(Clone, Default)]
pub struct ResourceConfig {
    /// Client used instead of the manager's default one
    pub api: Option<Arc<dyn HttpClient>>,
    /// Path prefix, e.g. `/api`
    pub base_path: Option<String>,
    /// Cache ttl for list and item reads
    pub cache_duration: Option<Duration>,
}

impl ResourceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api(mut self, api: Arc<dyn HttpClient>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = Some(duration);
        self
    }

    /// Base path, ignoring an empty string
    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref().filter(|p| !p.is_empty())
    }

    /// Cache duration, ignoring zero
    pub fn cache_duration(&self) -> Option<Duration> {
        self.cache_duration.filter(|d| !d.is_zero())
    }
}

impl fmt::Debug for ResourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceConfig")
            .field("api", &self.api.as_ref().map(|_| "<custom>"))
            .field("base_path", &self.base_path)
            .field("cache_duration", &self.cache_duration)
            .finish()
    }
}
