use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;
use std::time::Duration;

use super::custom_call::CustomCall;
use super::users::UserService;
use crate::api::{Params, ResourceId};
use crate::constants::{
    DEFAULT_HOURS, DEFAULT_PAGE_SIZE, DEFAULT_POPULAR_COUNT, DEFAULT_SUGGEST_BUILDING,
    REFERENCE_CACHE_MS, SHORT_CACHE_MS,
};
use crate::resources::ResourceService;
use crate::utils::{log_error, Result};

/// `areas` resource with its extra endpoints
#[derive(Clone)]
pub struct AreaService {
    resource: ResourceService,
    call: CustomCall,
    users: UserService,
}

impl AreaService {
    pub fn new(resource: ResourceService, call: CustomCall, users: UserService) -> Self {
        Self {
            resource,
            call,
            users,
        }
    }

    pub async fn popular(&self, count: Option<u32>) -> Result<Value> {
        let params = Params::new().with("count", count.unwrap_or(DEFAULT_POPULAR_COUNT));
        self.call
            .get_cached("/api/areas/popular/", params, Some(Duration::from_millis(SHORT_CACHE_MS)))
            .await
    }

    pub async fn suggested(&self, building_id: Option<u64>, count: Option<u32>) -> Result<Value> {
        let params = Params::new()
            .with("building", building_id.unwrap_or(DEFAULT_SUGGEST_BUILDING))
            .with("count", count.unwrap_or(DEFAULT_POPULAR_COUNT));
        self.call
            .get_cached("/api/areas/suggest/", params, Some(Duration::from_millis(SHORT_CACHE_MS)))
            .await
    }

    pub async fn historical(&self, id: u64, params: Params) -> Result<Value> {
        self.call
            .get(&format!("/api/areas/{}/historical/", id), params)
            .await
    }

    pub async fn temperature_humidity(&self, id: u64, hours: Option<u32>) -> Result<Value> {
        let params = Params::new().with("hours", hours.unwrap_or(DEFAULT_HOURS));
        self.call
            .get(&format!("/api/areas/{}/temperature_humidity/", id), params)
            .await
    }

    /// The signed-in user's favourite areas.
    ///
    /// Areas that fail to load are skipped; if the user itself can't be
    /// loaded the result is empty.
    pub async fn favorites(&self) -> Vec<Value> {
        let user = match self.users.user_info().await {
            Ok(user) => user,
            Err(e) => {
                log_error("❌", format!("Failed to load favourite areas: {}", e));
                return Vec::new();
            }
        };

        let ids: Vec<Value> = user
            .get("favorite_areas")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        if ids.is_empty() {
            return Vec::new();
        }

        let lookups = ids.into_iter().map(|id| async move {
            let label = id.to_string();
            let result = match serde_json::from_value::<ResourceId>(id) {
                Ok(id) => self.resource.get_by_id::<Value>(id, false).await,
                Err(e) => Err(e.into()),
            };
            result
                .map_err(|e| log_error("❌", format!("Failed to load area {}: {}", label, e)))
                .ok()
        });

        join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .filter(|area| !area.is_null())
            .collect()
    }

    pub async fn toggle_favorite(&self, id: u64) -> Result<Value> {
        self.call
            .post(&format!("/api/areas/{}/favor/", id), None)
            .await
    }
}

impl Deref for AreaService {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

/// One page of a building's areas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaPage {
    pub areas: Vec<Value>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

/// First page of areas for one building, as returned by the batch loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingAreas {
    #[serde(rename = "buildingId")]
    pub building_id: u64,
    #[serde(flatten)]
    pub page: AreaPage,
}

/// `buildings` resource with its extra endpoints
#[derive(Clone)]
pub struct BuildingService {
    resource: ResourceService,
    call: CustomCall,
}

impl BuildingService {
    pub fn new(resource: ResourceService, call: CustomCall) -> Self {
        Self { resource, call }
    }

    pub async fn areas(&self, id: u64) -> Result<Value> {
        self.call
            .get_cached(
                &format!("/api/buildings/{}/areas/", id),
                Params::new(),
                Some(Duration::from_millis(REFERENCE_CACHE_MS)),
            )
            .await
    }

    pub async fn areas_paginated(&self, id: u64, page: u32, page_size: u32) -> Result<AreaPage> {
        let params = Params::new().with("page", page).with("page_size", page_size);
        let body = self
            .call
            .get_cached(&format!("/api/buildings/{}/areas_paginated/", id), params, None)
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    pub async fn basic(&self) -> Result<Value> {
        self.call
            .get_cached(
                "/api/buildings/list_basic/",
                Params::new(),
                Some(Duration::from_millis(REFERENCE_CACHE_MS)),
            )
            .await
    }

    /// First page of areas for several buildings at once.
    ///
    /// Result order follows `building_ids`; a building that fails to load
    /// gets an empty page instead of failing the batch.
    pub async fn load_with_areas(&self, building_ids: &[u64], page_size: Option<u32>) -> Vec<BuildingAreas> {
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let loads = building_ids.iter().map(|&id| async move {
            let page = match self.areas_paginated(id, 1, page_size).await {
                Ok(page) => page,
                Err(e) => {
                    log_error("❌", format!("Failed to load areas for building {}: {}", id, e));
                    AreaPage::default()
                }
            };
            BuildingAreas { building_id: id, page }
        });

        join_all(loads).await
    }
}

impl Deref for BuildingService {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
