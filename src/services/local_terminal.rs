use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiRequest, HttpClient, Method, Params};
use crate::constants::LOCAL_HEARTBEAT_TIMEOUT_MS;
use crate::utils::{log_debug, log_info, log_warn, Notifier, Result};

/// Capabilities advertised by a terminal or server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentFeatures {
    pub local_detection: bool,
    pub websocket: bool,
    pub push_mode: bool,
    pub pull_mode: bool,
}

/// Descriptor returned by `/api/environment/`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub name: String,
    pub id: Option<u64>,
    pub features: EnvironmentFeatures,
}

impl EnvironmentInfo {
    /// Placeholder used when the terminal can't be reached
    pub fn unknown() -> Self {
        Self {
            kind: "unknown".into(),
            version: "unknown".into(),
            name: "Unknown".into(),
            id: None,
            features: EnvironmentFeatures::default(),
        }
    }

    /// Descriptor assumed when no local detector answers
    pub fn remote_server() -> Self {
        Self {
            kind: "server".into(),
            version: "unknown".into(),
            name: "Remote Server".into(),
            id: Some(1),
            features: EnvironmentFeatures {
                local_detection: false,
                websocket: true,
                push_mode: true,
                pull_mode: true,
            },
        }
    }

    pub fn is_detector(&self) -> bool {
        self.kind == "detector"
    }
}

/// Client for a terminal reachable on the local network.
///
/// Talks to its own HTTP client and never touches the resource cache.
#[derive(Clone)]
pub struct LocalTerminalService {
    api: Arc<dyn HttpClient>,
    notifier: Arc<dyn Notifier>,
    heartbeat_timeout: Duration,
}

impl LocalTerminalService {
    pub fn new(api: Arc<dyn HttpClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            heartbeat_timeout: Duration::from_millis(LOCAL_HEARTBEAT_TIMEOUT_MS),
        }
    }

    pub fn with_heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat_timeout = timeout;
        self
    }

    async fn get(&self, url: &str) -> Result<Value> {
        self.api.request(ApiRequest::get(url)).await
    }

    async fn post(&self, url: &str, data: Option<Value>) -> Result<Value> {
        self.api
            .request(ApiRequest::new(Method::Post, url).with_body(data))
            .await
    }

    pub async fn buzzer_status(&self) -> Result<Value> {
        self.get("/api/buzzer/status/").await
    }

    pub async fn control_buzzer(&self, action: Value) -> Result<Value> {
        self.post("/api/buzzer/", Some(action)).await
    }

    pub async fn light_rotate(&self, data: Value) -> Result<Value> {
        self.post("/api/light/rotate/", Some(data)).await
    }

    pub async fn light_status(&self, node_id: u64) -> Result<Value> {
        self.get(&format!("/api/light/status/{}", node_id)).await
    }

    pub async fn status(&self) -> Result<Value> {
        self.get("/api/status/").await
    }

    pub async fn config(&self) -> Result<Value> {
        self.get("/api/config/").await
    }

    pub async fn update_config(&self, config: Value) -> Result<Value> {
        self.post("/api/config/", Some(config)).await
    }

    pub async fn logs(&self) -> Result<Value> {
        self.get("/api/logs/").await
    }

    /// Posts `{action, ...params}`
    pub async fn send_command(&self, action: &str, params: Params) -> Result<Value> {
        let mut body = Map::new();
        body.insert("action".into(), Value::String(action.to_string()));
        for (key, value) in params.iter() {
            body.entry(key.clone()).or_insert_with(|| value.clone());
        }
        self.post("/api/control/", Some(Value::Object(body))).await
    }

    /// Raw terminal info from `/api/info/`
    pub async fn info(&self) -> Result<Value> {
        self.get("/api/info/").await
    }

    /// Latest camera frame for a node
    pub async fn last_image(&self, node_id: u64) -> Result<Bytes> {
        self.api
            .request_bytes(ApiRequest::get(format!("/api/image/last/{}", node_id)))
            .await
    }

    async fn fetch_environment(&self) -> Result<EnvironmentInfo> {
        let body = self.get("/api/environment/").await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Environment descriptor of the local terminal, or [`EnvironmentInfo::unknown`]
    pub async fn environment_info(&self) -> EnvironmentInfo {
        match self.fetch_environment().await {
            Ok(info) => info,
            Err(e) => {
                self.notifier
                    .warn(&format!("Could not reach local terminal: {}", e));
                EnvironmentInfo::unknown()
            }
        }
    }

    /// Quick reachability probe against `/api/heartbeat/`
    pub async fn check_local_available(&self) -> bool {
        let request = ApiRequest::get("/api/heartbeat/").with_timeout(self.heartbeat_timeout);
        match self.api.request(request).await {
            Ok(_) => true,
            Err(e) => {
                log_debug(format!("Local terminal heartbeat failed: {}", e));
                false
            }
        }
    }

    /// Use the local detector if one answers, otherwise assume the remote server.
    /// The environment endpoint is only asked once the heartbeat succeeds.
    pub async fn auto_detect_environment(&self) -> EnvironmentInfo {
        if self.check_local_available().await {
            match self.fetch_environment().await {
                Ok(info) if info.is_detector() => {
                    log_info("📡", format!("Local detector found: {}", info.name));
                    return info;
                }
                Ok(info) => log_debug(format!("Local endpoint reports '{}'", info.kind)),
                Err(e) => log_warn("⚠️", format!("Failed to read local environment: {}", e)),
            }
        }

        self.notifier
            .warn("No local detector found, falling back to remote server");
        EnvironmentInfo::remote_server()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockHttpClient;
    use crate::utils::{MockNotifier, ResourceError};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn service(mock: MockHttpClient, notifier: MockNotifier) -> LocalTerminalService {
        LocalTerminalService::new(Arc::new(mock), Arc::new(notifier))
    }

    #[tokio::test]
    async fn test_environment_info_degrades_to_unknown() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .returning(|_| Err(ResourceError::Unavailable("refused".into())));
        let mut notifier = MockNotifier::new();
        notifier.expect_warn().times(1).return_const(());

        let info = service(mock, notifier).environment_info().await;
        assert_eq!(info, EnvironmentInfo::unknown());
    }

    fn heartbeat_ok(mock: &mut MockHttpClient) {
        mock.expect_request()
            .withf(|req| req.url == "/api/heartbeat/")
            .times(1)
            .returning(|_| Ok(json!({"alive": true})));
    }

    #[tokio::test]
    async fn test_environment_info_reads_environment_endpoint() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| req.url == "/api/environment/")
            .times(1)
            .returning(|_| Ok(json!({"type": "detector", "name": "Lab terminal"})));
        mock.expect_request()
            .withf(|req| req.url == "/api/info/")
            .never();

        let info = service(mock, MockNotifier::new()).environment_info().await;
        assert!(info.is_detector());
        assert_eq!(info.name, "Lab terminal");
    }

    #[tokio::test]
    async fn test_info_is_raw_body() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| req.method == Method::Get && req.url == "/api/info/")
            .times(1)
            .returning(|_| Ok(json!({"hostname": "pi-04", "uptime": 120})));

        let info = service(mock, MockNotifier::new()).info().await.unwrap();
        assert_eq!(info, json!({"hostname": "pi-04", "uptime": 120}));
    }

    #[tokio::test]
    async fn test_auto_detect_prefers_local_detector() {
        let mut mock = MockHttpClient::new();
        heartbeat_ok(&mut mock);
        mock.expect_request()
            .withf(|req| req.url == "/api/environment/")
            .times(1)
            .returning(|_| {
                Ok(json!({
                    "type": "detector",
                    "version": "2.1",
                    "name": "Lab terminal",
                    "id": 9,
                    "features": {"local_detection": true}
                }))
            });
        mock.expect_request()
            .withf(|req| req.url == "/api/info/")
            .never()
            .returning(|_| Ok(json!({"hostname": "pi-04"})));
        let mut notifier = MockNotifier::new();
        notifier.expect_warn().never();

        let info = service(mock, notifier).auto_detect_environment().await;
        assert!(info.is_detector());
        assert_eq!(info.id, Some(9));
        assert!(info.features.local_detection);
        assert!(!info.features.websocket);
    }

    #[tokio::test]
    async fn test_auto_detect_skips_environment_without_heartbeat() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| req.url == "/api/heartbeat/")
            .times(1)
            .returning(|_| Err(ResourceError::Unavailable("refused".into())));
        mock.expect_request()
            .withf(|req| req.url == "/api/environment/")
            .never()
            .returning(|_| Ok(json!({"type": "detector"})));
        let mut notifier = MockNotifier::new();
        notifier.expect_warn().times(1).return_const(());

        let info = service(mock, notifier).auto_detect_environment().await;
        assert_eq!(info, EnvironmentInfo::remote_server());
    }

    #[tokio::test]
    async fn test_auto_detect_falls_back_once() {
        let mut mock = MockHttpClient::new();
        heartbeat_ok(&mut mock);
        mock.expect_request()
            .withf(|req| req.url == "/api/environment/")
            .times(1)
            .returning(|_| Err(ResourceError::Unavailable("refused".into())));
        let mut notifier = MockNotifier::new();
        notifier.expect_warn().times(1).return_const(());

        let info = service(mock, notifier).auto_detect_environment().await;
        assert_eq!(info, EnvironmentInfo::remote_server());
    }

    #[tokio::test]
    async fn test_auto_detect_ignores_non_detector() {
        let mut mock = MockHttpClient::new();
        heartbeat_ok(&mut mock);
        mock.expect_request()
            .withf(|req| req.url == "/api/environment/")
            .returning(|_| Ok(json!({"type": "server"})));
        let mut notifier = MockNotifier::new();
        notifier.expect_warn().times(1).return_const(());

        let info = service(mock, notifier).auto_detect_environment().await;
        assert_eq!(info, EnvironmentInfo::remote_server());
    }

    #[tokio::test]
    async fn test_light_rotate_posts_payload() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| {
                req.method == Method::Post
                    && req.url == "/api/light/rotate/"
                    && req.body == Some(json!({"node_id": 2, "angle": 90}))
            })
            .times(1)
            .returning(|_| Ok(json!({"ok": true})));

        service(mock, MockNotifier::new())
            .light_rotate(json!({"node_id": 2, "angle": 90}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_heartbeat_uses_short_timeout() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| {
                req.url == "/api/heartbeat/" && req.timeout == Some(Duration::from_millis(250))
            })
            .times(1)
            .returning(|_| Ok(json!({"alive": true})));

        let service = service(mock, MockNotifier::new())
            .with_heartbeat_timeout(Duration::from_millis(250));
        assert!(service.check_local_available().await);
    }

    #[tokio::test]
    async fn test_send_command_merges_params() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| {
                req.method == Method::Post
                    && req.url == "/api/control/"
                    && req.body == Some(json!({"action": "capture", "node": 3}))
            })
            .times(1)
            .returning(|_| Ok(json!({"ok": true})));

        service(mock, MockNotifier::new())
            .send_command("capture", Params::new().with("node", 3))
            .await
            .unwrap();
    }
}
