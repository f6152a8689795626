use serde_json::Value;
use std::ops::Deref;
use std::time::Duration;

use super::custom_call::CustomCall;
use crate::api::Params;
use crate::constants::{DEFAULT_POPULAR_COUNT, SHORT_CACHE_MS};
use crate::resources::ResourceService;
use crate::utils::Result;

fn short_ttl() -> Option<Duration> {
    Some(Duration::from_millis(SHORT_CACHE_MS))
}

/// `alerts` resource
#[derive(Clone)]
pub struct AlertService {
    resource: ResourceService,
    call: CustomCall,
}

impl AlertService {
    pub fn new(resource: ResourceService, call: CustomCall) -> Self {
        Self { resource, call }
    }

    pub async fn unsolved(&self) -> Result<Value> {
        self.call
            .get_cached("/api/alerts/unsolved/", Params::new(), short_ttl())
            .await
    }

    pub async fn public(&self) -> Result<Value> {
        self.call
            .get_cached("/api/alerts/public/", Params::new(), short_ttl())
            .await
    }

    pub async fn solve(&self, id: u64) -> Result<Value> {
        self.call
            .post(&format!("/api/alerts/{}/solve/", id), None)
            .await
    }
}

impl Deref for AlertService {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

/// `notice` resource
#[derive(Clone)]
pub struct NoticeService {
    resource: ResourceService,
    call: CustomCall,
}

impl NoticeService {
    pub fn new(resource: ResourceService, call: CustomCall) -> Self {
        Self { resource, call }
    }

    pub async fn latest(&self, count: Option<u32>) -> Result<Value> {
        let params = Params::new().with("count", count.unwrap_or(DEFAULT_POPULAR_COUNT));
        self.call
            .get_cached("/api/notice/latest/", params, short_ttl())
            .await
    }

    pub async fn areas(&self, id: u64) -> Result<Value> {
        self.call
            .get(&format!("/api/notice/{}/areas/", id), Params::new())
            .await
    }
}

impl Deref for NoticeService {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

/// Dashboard summary; not a CRUD resource
#[derive(Clone)]
pub struct SummaryService {
    call: CustomCall,
}

impl SummaryService {
    pub fn new(call: CustomCall) -> Self {
        Self { call }
    }

    pub async fn summary(&self) -> Result<Value> {
        self.call
            .get_cached("/api/summary/", Params::new(), short_ttl())
            .await
    }
}

/// Raw data and alert uploads
#[derive(Clone)]
pub struct UploadService {
    call: CustomCall,
}

impl UploadService {
    pub fn new(call: CustomCall) -> Self {
        Self { call }
    }

    pub async fn upload(&self, data: Value) -> Result<Value> {
        self.call.post("/api/upload/", Some(data)).await
    }

    pub async fn alert(&self, data: Value) -> Result<Value> {
        self.call.post("/api/alert/", Some(data)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Method, MockHttpClient};
    use crate::resources::ResourceManager;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_solve_leaves_cached_unsolved_list() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| req.method == Method::Get && req.url == "/api/alerts/unsolved/")
            .times(1)
            .returning(|_| Ok(json!([{"id": 4}])));
        mock.expect_request()
            .withf(|req| req.method == Method::Post && req.url == "/api/alerts/4/solve/")
            .times(1)
            .returning(|_| Ok(json!({"solved": true})));

        let manager = Arc::new(ResourceManager::new(Arc::new(mock)));
        let alerts = AlertService::new(
            ResourceService::new("alerts", manager.clone()),
            CustomCall::new(manager),
        );

        alerts.unsolved().await.unwrap();
        alerts.solve(4).await.unwrap();
        assert_eq!(alerts.unsolved().await.unwrap(), json!([{"id": 4}]));
    }

    #[tokio::test]
    async fn test_summary_cached() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| req.url == "/api/summary/")
            .times(1)
            .returning(|_| Ok(json!({"areas": 12})));

        let manager = Arc::new(ResourceManager::new(Arc::new(mock)));
        let summary = SummaryService::new(CustomCall::new(manager));

        summary.summary().await.unwrap();
        assert_eq!(summary.summary().await.unwrap(), json!({"areas": 12}));
    }
}
