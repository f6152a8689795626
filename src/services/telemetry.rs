use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;
use std::time::Duration;

use super::custom_call::CustomCall;
use crate::api::Params;
use crate::constants::{DEFAULT_HOURS, DEFAULT_LATEST_COUNT, SHORT_CACHE_MS};
use crate::resources::ResourceService;
use crate::utils::Result;

/// One temperature/humidity sample for upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureHumidityReading {
    pub area_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// One CO2 sample for upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Co2Reading {
    pub terminal_id: u64,
    pub co2_level: f64,
    pub timestamp: DateTime<Utc>,
}

fn date_range(start: &str, end: &str) -> Params {
    Params::new().with("start_date", start).with("end_date", end)
}

/// `historical` resource
#[derive(Clone)]
pub struct HistoricalService {
    resource: ResourceService,
    call: CustomCall,
}

impl HistoricalService {
    pub fn new(resource: ResourceService, call: CustomCall) -> Self {
        Self { resource, call }
    }

    pub async fn area(&self, area_id: u64, params: Params) -> Result<Value> {
        self.call
            .get(&format!("/api/areas/{}/historical/", area_id), params)
            .await
    }

    /// Extra params are sent along; the range always wins over them
    pub async fn by_date_range(&self, start: &str, end: &str, mut params: Params) -> Result<Value> {
        params.extend(date_range(start, end));
        self.call.get("/api/historical/", params).await
    }

    pub async fn latest(&self, count: Option<u32>) -> Result<Value> {
        let params = Params::new().with("count", count.unwrap_or(DEFAULT_LATEST_COUNT));
        self.call.get("/api/historical/latest/", params).await
    }
}

impl Deref for HistoricalService {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

/// `temperature-humidity` resource
#[derive(Clone)]
pub struct TemperatureHumidityService {
    resource: ResourceService,
    call: CustomCall,
}

impl TemperatureHumidityService {
    pub fn new(resource: ResourceService, call: CustomCall) -> Self {
        Self { resource, call }
    }

    pub async fn latest(&self, count: Option<u32>) -> Result<Value> {
        let params = Params::new().with("count", count.unwrap_or(DEFAULT_LATEST_COUNT));
        self.call
            .get_cached(
                "/api/temperature-humidity/latest/",
                params,
                Some(Duration::from_millis(SHORT_CACHE_MS)),
            )
            .await
    }

    pub async fn by_area(&self, area_id: u64, hours: Option<u32>) -> Result<Value> {
        let params = Params::new()
            .with("area_id", area_id)
            .with("hours", hours.unwrap_or(DEFAULT_HOURS));
        self.call
            .get("/api/temperature-humidity/by_area/", params)
            .await
    }

    /// Same data through the areas endpoint
    pub async fn area_data(&self, area_id: u64, hours: Option<u32>) -> Result<Value> {
        let params = Params::new().with("hours", hours.unwrap_or(DEFAULT_HOURS));
        self.call
            .get(&format!("/api/areas/{}/temperature_humidity/", area_id), params)
            .await
    }

    pub async fn upload(&self, reading: &TemperatureHumidityReading) -> Result<Value> {
        self.call
            .post(
                "/api/upload/temperature-humidity/",
                Some(serde_json::to_value(reading)?),
            )
            .await
    }

    pub async fn by_date_range(&self, start: &str, end: &str, area_id: Option<u64>) -> Result<Value> {
        let mut params = date_range(start, end);
        if let Some(area_id) = area_id {
            params.insert("area_id", area_id);
        }
        self.call.get("/api/temperature-humidity/", params).await
    }
}

impl Deref for TemperatureHumidityService {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

/// `co2` resource
#[derive(Clone)]
pub struct Co2Service {
    resource: ResourceService,
    call: CustomCall,
}

impl Co2Service {
    pub fn new(resource: ResourceService, call: CustomCall) -> Self {
        Self { resource, call }
    }

    pub async fn latest(&self, count: Option<u32>) -> Result<Value> {
        let params = Params::new().with("count", count.unwrap_or(DEFAULT_LATEST_COUNT));
        self.call
            .get_cached("/api/co2/latest/", params, Some(Duration::from_millis(SHORT_CACHE_MS)))
            .await
    }

    pub async fn by_terminal(&self, terminal_id: u64, hours: Option<u32>) -> Result<Value> {
        let params = Params::new()
            .with("terminal_id", terminal_id)
            .with("hours", hours.unwrap_or(DEFAULT_HOURS));
        self.call.get("/api/co2/by_terminal/", params).await
    }

    /// Same data through the terminals endpoint
    pub async fn terminal_data(&self, terminal_id: u64, hours: Option<u32>) -> Result<Value> {
        let params = Params::new().with("hours", hours.unwrap_or(DEFAULT_HOURS));
        self.call
            .get(&format!("/api/terminals/{}/co2_data/", terminal_id), params)
            .await
    }

    pub async fn upload(&self, reading: &Co2Reading) -> Result<Value> {
        self.call
            .post("/api/upload/co2/", Some(serde_json::to_value(reading)?))
            .await
    }

    pub async fn by_date_range(&self, start: &str, end: &str, terminal_id: Option<u64>) -> Result<Value> {
        let mut params = date_range(start, end);
        if let Some(terminal_id) = terminal_id {
            params.insert("terminal_id", terminal_id);
        }
        self.call.get("/api/co2/", params).await
    }
}

impl Deref for Co2Service {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Method, MockHttpClient};
    use crate::resources::ResourceManager;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn call(mock: MockHttpClient) -> (Arc<ResourceManager>, CustomCall) {
        let manager = Arc::new(ResourceManager::new(Arc::new(mock)));
        (manager.clone(), CustomCall::new(manager))
    }

    #[tokio::test]
    async fn test_date_range_overrides_params() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| {
                req.url == "/api/historical/"
                    && req.params.get("start_date") == Some(&json!("2024-01-01"))
                    && req.params.get("end_date") == Some(&json!("2024-01-31"))
                    && req.params.get("area") == Some(&json!(3))
            })
            .times(1)
            .returning(|_| Ok(json!([])));

        let (manager, call) = call(mock);
        let historical = HistoricalService::new(ResourceService::new("historical", manager), call);

        let extra = Params::new().with("area", 3).with("start_date", "ignored");
        historical
            .by_date_range("2024-01-01", "2024-01-31", extra)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_co2_upload_serializes_reading() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| {
                req.method == Method::Post
                    && req.url == "/api/upload/co2/"
                    && req.body
                        == Some(json!({
                            "terminal_id": 7,
                            "co2_level": 415.5,
                            "timestamp": "2024-03-01T12:00:00Z"
                        }))
            })
            .times(1)
            .returning(|_| Ok(json!({"ok": true})));

        let (manager, call) = call(mock);
        let co2 = Co2Service::new(ResourceService::new("co2", manager), call);

        let reading = Co2Reading {
            terminal_id: 7,
            co2_level: 415.5,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        };
        co2.upload(&reading).await.unwrap();
    }

    #[tokio::test]
    async fn test_optional_area_filter() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| req.params.get("area_id").is_none())
            .times(1)
            .returning(|_| Ok(json!([])));
        mock.expect_request()
            .withf(|req| req.params.get("area_id") == Some(&json!(2)))
            .times(1)
            .returning(|_| Ok(json!([])));

        let (manager, call) = call(mock);
        let th = TemperatureHumidityService::new(
            ResourceService::new("temperature-humidity", manager),
            call,
        );

        th.by_date_range("a", "b", None).await.unwrap();
        th.by_date_range("a", "b", Some(2)).await.unwrap();
    }
}
