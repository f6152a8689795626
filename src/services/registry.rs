use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::areas::{AreaService, BuildingService};
use super::custom_call::CustomCall;
use super::local_terminal::LocalTerminalService;
use super::notices::{AlertService, NoticeService, SummaryService, UploadService};
use super::telemetry::{Co2Service, HistoricalService, TemperatureHumidityService};
use super::terminals::{NodeService, TerminalService};
use super::users::{AuthService, UserService};
use crate::api::{HttpClient, Method, Params, RestClient};
use crate::app::Config;
use crate::constants::{DEFAULT_BASE_PATH, DEFAULT_CACHE_DURATIONS, DEFAULT_GLOBAL_CACHE_MS};
use crate::resources::{ResourceConfig, ResourceManager, ResourceService};
use crate::utils::{log_info, log_warn, LogNotifier, Notifier, Result};

/// Table lifetime for a resource type, else the two minute fallback
pub fn default_cache_duration(resource_type: &str) -> Duration {
    let ms = DEFAULT_CACHE_DURATIONS
        .iter()
        .find(|(name, _)| *name == resource_type)
        .map(|(_, ms)| *ms)
        .unwrap_or(DEFAULT_GLOBAL_CACHE_MS);
    Duration::from_millis(ms)
}

/// Every service, wired against one shared manager
#[derive(Clone)]
pub struct ApiServices {
    pub manager: Arc<ResourceManager>,
    pub call: CustomCall,
    pub areas: AreaService,
    pub buildings: BuildingService,
    pub nodes: NodeService,
    pub terminals: TerminalService,
    pub alerts: AlertService,
    pub notice: NoticeService,
    pub users: UserService,
    pub historical: HistoricalService,
    pub temperature_humidity: TemperatureHumidityService,
    pub co2: Co2Service,
    pub summary: SummaryService,
    pub uploads: UploadService,
    pub local_terminal: LocalTerminalService,
}

impl ApiServices {
    /// Build every service and seed the per-resource configuration table
    pub fn new(
        manager: Arc<ResourceManager>,
        local_api: Arc<dyn HttpClient>,
        auth: Arc<dyn AuthService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        for (resource_type, ms) in DEFAULT_CACHE_DURATIONS {
            manager.set_resource_config(
                resource_type,
                ResourceConfig::new()
                    .with_base_path(DEFAULT_BASE_PATH)
                    .with_cache_duration(Duration::from_millis(*ms)),
            );
        }

        let call = CustomCall::new(manager.clone());
        let resource = |resource_type: &str| ResourceService::new(resource_type, manager.clone());

        let users = UserService::new(resource("users"), auth);

        Self {
            areas: AreaService::new(resource("areas"), call.clone(), users.clone()),
            buildings: BuildingService::new(resource("buildings"), call.clone()),
            nodes: NodeService::new(resource("nodes"), call.clone()),
            terminals: TerminalService::new(resource("terminals"), call.clone()),
            alerts: AlertService::new(resource("alerts"), call.clone()),
            notice: NoticeService::new(resource("notice"), call.clone()),
            historical: HistoricalService::new(resource("historical"), call.clone()),
            temperature_humidity: TemperatureHumidityService::new(
                resource("temperature-humidity"),
                call.clone(),
            ),
            co2: Co2Service::new(resource("co2"), call.clone()),
            summary: SummaryService::new(call.clone()),
            uploads: UploadService::new(call.clone()),
            local_terminal: LocalTerminalService::new(local_api, notifier),
            users,
            call,
            manager,
        }
    }

    /// Wire reqwest clients from loaded configuration, then apply its
    /// lifetime overrides on top of the seeded table
    pub fn from_config(config: &Config, auth: Arc<dyn AuthService>) -> Result<Self> {
        let mut api = RestClient::new(&config.api.base_url, config.api.timeout())?;
        if let Some(token) = &config.api.auth_token {
            api = api.with_auth_token(token.clone());
        }
        let local = RestClient::new(&config.local.base_url, config.local.timeout())?;

        let manager = Arc::new(ResourceManager::new(Arc::new(api)));
        let mut services = Self::new(manager, Arc::new(local), auth, Arc::new(LogNotifier));
        services.local_terminal = services
            .local_terminal
            .with_heartbeat_timeout(config.local.heartbeat_timeout());

        services.set_global_cache_duration(config.cache.global_ttl());
        for (resource_type, ms) in &config.cache.resources {
            let duration = Duration::from_millis(*ms);
            if services.manager.has_resource_config(resource_type) {
                services.set_resource_cache_duration(resource_type, duration);
            } else {
                services.manager.set_resource_config(
                    resource_type,
                    ResourceConfig::new()
                        .with_base_path(DEFAULT_BASE_PATH)
                        .with_cache_duration(duration),
                );
            }
        }

        Ok(services)
    }

    /// Preload commonly used resources. Individual failures are logged and
    /// do not fail initialization.
    pub async fn initialize(&self) -> bool {
        let preloads = vec![self.buildings.get_all::<Value>(Params::new(), true)];

        for result in join_all(preloads).await {
            if let Err(e) = result {
                log_warn("⚠️", format!("Preload failed: {}", e));
            }
        }

        log_info("🚀", "API services initialized");
        true
    }

    pub fn clear_all_caches(&self) {
        self.manager.clear_cache();
    }

    pub fn refresh_resource_cache(&self, resource_type: &str) -> usize {
        self.manager.invalidate_cache(resource_type)
    }

    pub fn set_global_cache_duration(&self, duration: Duration) {
        self.manager.set_global_cache_duration(duration);
    }

    /// False when the resource type has no configuration to update
    pub fn set_resource_cache_duration(&self, resource_type: &str, duration: Duration) -> bool {
        self.manager.set_resource_cache_duration(resource_type, duration)
    }

    pub fn default_cache_duration(&self, resource_type: &str) -> Duration {
        default_cache_duration(resource_type)
    }

    /// Restore the table lifetime; returns it, or `None` for an unregistered type
    pub fn reset_cache_duration(&self, resource_type: &str) -> Option<Duration> {
        let duration = default_cache_duration(resource_type);
        self.set_resource_cache_duration(resource_type, duration)
            .then_some(duration)
    }

    pub async fn custom_get(&self, url: &str, params: Params, use_cache: bool) -> Result<Value> {
        self.call
            .call(url, Method::Get, None, params, use_cache, None)
            .await
    }

    pub async fn custom_post(&self, url: &str, data: Value) -> Result<Value> {
        self.call.post(url, Some(data)).await
    }

    pub async fn custom_put(&self, url: &str, data: Value) -> Result<Value> {
        self.call.put(url, Some(data)).await
    }

    pub async fn custom_delete(&self, url: &str) -> Result<Value> {
        self.call.delete(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockHttpClient;
    use crate::cache::ManualClock;
    use crate::services::users::NoAuth;
    use crate::utils::{MockNotifier, ResourceError};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn services(mock: MockHttpClient, clock: Arc<ManualClock>) -> ApiServices {
        let manager = Arc::new(ResourceManager::with_clock(Arc::new(mock), clock));
        ApiServices::new(
            manager,
            Arc::new(MockHttpClient::new()),
            Arc::new(NoAuth),
            Arc::new(MockNotifier::new()),
        )
    }

    fn counting(mock: &mut MockHttpClient, url: &'static str, calls: Arc<AtomicUsize>) {
        mock.expect_request()
            .withf(move |req| req.method == Method::Get && req.url == url)
            .returning(move |_| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!([{"call": n}]))
            });
    }

    #[test]
    fn test_default_cache_duration_table() {
        assert_eq!(default_cache_duration("areas"), Duration::from_secs(60));
        assert_eq!(default_cache_duration("co2"), Duration::from_secs(120));
        assert_eq!(default_cache_duration("unknown"), Duration::from_secs(120));
    }

    #[test]
    fn test_new_seeds_table() {
        let services = services(MockHttpClient::new(), Arc::new(ManualClock::new()));

        assert_eq!(
            services.manager.resolve_cache_duration("buildings"),
            Duration::from_secs(300)
        );
        assert_eq!(
            services.manager.resource_config("areas").base_path(),
            Some(DEFAULT_BASE_PATH)
        );
    }

    #[tokio::test]
    async fn test_areas_read_twice_within_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut mock = MockHttpClient::new();
        counting(&mut mock, "/api/areas/", calls.clone());

        let clock = Arc::new(ManualClock::new());
        let services = services(mock, clock.clone());

        let first: Vec<Value> = services.areas.get_all(Params::new(), false).await.unwrap();
        clock.advance(Duration::from_secs(59));
        let second: Vec<Value> = services.areas.get_all(Params::new(), false).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_co2_resource_ttl_beats_global() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut mock = MockHttpClient::new();
        counting(&mut mock, "/api/co2/", calls.clone());

        let clock = Arc::new(ManualClock::new());
        let services = services(mock, clock.clone());
        services.set_global_cache_duration(Duration::from_secs(300));

        let _: Vec<Value> = services.co2.get_all(Params::new(), false).await.unwrap();
        clock.advance(Duration::from_secs(180));
        let _: Vec<Value> = services.co2.get_all(Params::new(), false).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reset_restores_table_value() {
        let services = services(MockHttpClient::new(), Arc::new(ManualClock::new()));

        assert!(services.set_resource_cache_duration("nodes", Duration::from_secs(1)));
        assert_eq!(
            services.reset_cache_duration("nodes"),
            Some(Duration::from_secs(30))
        );
        assert_eq!(services.reset_cache_duration("sensors"), None);
        assert_eq!(
            services.manager.resolve_cache_duration("nodes"),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_from_config_applies_overrides() {
        let mut config = Config::default();
        config.cache.global_ttl_ms = 90_000;
        config.cache.resources.insert("areas".into(), 10_000);
        config.cache.resources.insert("sensors".into(), 15_000);

        let services = ApiServices::from_config(&config, Arc::new(NoAuth)).unwrap();
        let manager = &services.manager;

        assert_eq!(manager.global_cache_duration(), Duration::from_secs(90));
        assert_eq!(manager.resolve_cache_duration("areas"), Duration::from_secs(10));
        assert_eq!(manager.resolve_cache_duration("sensors"), Duration::from_secs(15));
        assert_eq!(
            manager.resource_config("sensors").base_path(),
            Some(DEFAULT_BASE_PATH)
        );
    }

    #[tokio::test]
    async fn test_initialize_survives_failed_preload() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| req.url == "/api/buildings/")
            .times(1)
            .returning(|_| Err(ResourceError::Unavailable("down".into())));

        let services = services(mock, Arc::new(ManualClock::new()));
        assert!(services.initialize().await);
    }

    #[tokio::test]
    async fn test_refresh_resource_cache_by_prefix() {
        let mut mock = MockHttpClient::new();
        mock.expect_request().returning(|req| Ok(json!({"url": req.url})));

        let services = services(mock, Arc::new(ManualClock::new()));
        let _: Vec<Value> = services.areas.get_all(Params::new(), false).await.unwrap();
        let _: Value = services.areas.get_by_id(3, false).await.unwrap();
        let _: Vec<Value> = services.buildings.get_all(Params::new(), false).await.unwrap();

        assert_eq!(services.refresh_resource_cache("areas"), 2);
        assert_eq!(services.manager.cache_keys(), vec!["buildings".to_string()]);
    }
}
