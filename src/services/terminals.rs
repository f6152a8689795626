use serde_json::Value;
use std::ops::Deref;
use std::time::Duration;

use super::custom_call::CustomCall;
use crate::api::Params;
use crate::constants::{DEFAULT_HOURS, NODE_DATA_CACHE_MS};
use crate::resources::ResourceService;
use crate::utils::Result;

/// `nodes` resource
#[derive(Clone)]
pub struct NodeService {
    resource: ResourceService,
    call: CustomCall,
}

impl NodeService {
    pub fn new(resource: ResourceService, call: CustomCall) -> Self {
        Self { resource, call }
    }

    /// Latest node readings for an area, cached briefly
    pub async fn data_by_area(&self, area_id: u64) -> Result<Value> {
        self.call
            .get_cached(
                &format!("/api/areas/{}/data/", area_id),
                Params::new(),
                Some(Duration::from_millis(NODE_DATA_CACHE_MS)),
            )
            .await
    }
}

impl Deref for NodeService {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

/// `terminals` resource. Status-like endpoints are never cached.
#[derive(Clone)]
pub struct TerminalService {
    resource: ResourceService,
    call: CustomCall,
}

impl TerminalService {
    pub fn new(resource: ResourceService, call: CustomCall) -> Self {
        Self { resource, call }
    }

    pub async fn nodes(&self, id: u64) -> Result<Value> {
        self.call
            .get(&format!("/api/terminals/{}/nodes/", id), Params::new())
            .await
    }

    pub async fn status(&self, id: u64) -> Result<Value> {
        self.call
            .get(&format!("/api/terminals/{}/status/", id), Params::new())
            .await
    }

    pub async fn buzzer_status(&self, id: u64) -> Result<Value> {
        self.call
            .get(&format!("/api/terminals/{}/buzzer/status/", id), Params::new())
            .await
    }

    pub async fn logs(&self, id: u64, params: Params) -> Result<Value> {
        self.call
            .get(&format!("/api/terminals/{}/logs/", id), params)
            .await
    }

    pub async fn config(&self, id: u64) -> Result<Value> {
        self.call
            .get(&format!("/api/terminals/{}/config/", id), Params::new())
            .await
    }

    pub async fn co2_data(&self, id: u64, hours: Option<u32>) -> Result<Value> {
        let params = Params::new().with("hours", hours.unwrap_or(DEFAULT_HOURS));
        self.call
            .get(&format!("/api/terminals/{}/co2_data/", id), params)
            .await
    }

    pub async fn send_command(&self, id: u64, command: Value) -> Result<Value> {
        self.call
            .post(&format!("/api/terminals/{}/command/", id), Some(command))
            .await
    }

    pub async fn update_config(&self, id: u64, config: Value) -> Result<Value> {
        self.call
            .post(&format!("/api/terminals/{}/config/", id), Some(config))
            .await
    }
}

impl Deref for TerminalService {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}
