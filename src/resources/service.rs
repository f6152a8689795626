use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use super::manager::ResourceManager;
use crate::api::{Params, ResourceId};
use crate::utils::{ResourceError, Result};

/// Arguments every service method receives when dispatched by name
#[derive(Debug, Clone, Default)]
pub struct MethodArgs {
    pub id: Option<ResourceId>,
    pub params: Params,
    pub data: Option<Value>,
    pub force_refresh: bool,
}

impl MethodArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<ResourceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    fn require_id(&self, method: &str) -> Result<ResourceId> {
        self.id
            .clone()
            .ok_or_else(|| ResourceError::InvalidArgument(format!("{} needs an id", method)))
    }

    fn take_data(&mut self) -> Value {
        self.data.take().unwrap_or(Value::Null)
    }
}

/// A named method added to (or replacing one of) a service's standard set
pub type CustomMethod = Arc<dyn Fn(MethodArgs) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Names of the built-in methods, in declaration order
pub const STANDARD_METHODS: &[&str] = &[
    "getAll",
    "getById",
    "create",
    "update",
    "patch",
    "delete",
    "refreshAll",
    "refreshById",
    "clearCache",
];

/// CRUD service bound to one resource type.
///
/// Every call goes through [`ResourceService::invoke`], which looks at the
/// custom methods first, so a custom entry named like a standard method
/// replaces it for the typed helpers too.
#[derive(Clone)]
pub struct ResourceService {
    resource_type: String,
    manager: Arc<ResourceManager>,
    custom: HashMap<String, CustomMethod>,
}

impl ResourceService {
    pub fn new(resource_type: impl Into<String>, manager: Arc<ResourceManager>) -> Self {
        Self {
            resource_type: resource_type.into(),
            manager,
            custom: HashMap::new(),
        }
    }

    /// Start building a service with custom methods
    pub fn builder(resource_type: impl Into<String>, manager: Arc<ResourceManager>) -> ServiceBuilder {
        ServiceBuilder {
            service: Self::new(resource_type, manager),
        }
    }

    /// Overlay a whole map of custom methods; later entries win
    pub fn with_methods(mut self, methods: HashMap<String, CustomMethod>) -> Self {
        self.custom.extend(methods);
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn manager(&self) -> &Arc<ResourceManager> {
        &self.manager
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.custom.contains_key(name) || STANDARD_METHODS.contains(&name)
    }

    /// Every callable name, sorted
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = STANDARD_METHODS.iter().map(|s| s.to_string()).collect();
        for name in self.custom.keys() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names.sort();
        names
    }

    /// Call a method by name, custom entries first
    pub async fn invoke(&self, name: &str, args: MethodArgs) -> Result<Value> {
        if let Some(method) = self.custom.get(name) {
            return method(args).await;
        }
        self.invoke_standard(name, args).await
    }

    async fn invoke_standard(&self, name: &str, mut args: MethodArgs) -> Result<Value> {
        let manager = &self.manager;
        let resource_type = self.resource_type.as_str();

        match name {
            "getAll" | "refreshAll" => {
                let force = name == "refreshAll" || args.force_refresh;
                let items = manager.get_list(resource_type, &args.params, force).await?;
                Ok(Value::Array(items))
            }
            "getById" | "refreshById" => {
                let id = args.require_id(name)?;
                let force = name == "refreshById" || args.force_refresh;
                manager.get_by_id(resource_type, id, force).await
            }
            "create" => manager.create(resource_type, args.take_data()).await,
            "update" => {
                let id = args.require_id(name)?;
                manager.update(resource_type, id, args.take_data()).await
            }
            "patch" => {
                let id = args.require_id(name)?;
                manager.patch(resource_type, id, args.take_data()).await
            }
            "delete" => {
                let id = args.require_id(name)?;
                manager.delete(resource_type, id).await?;
                Ok(Value::Null)
            }
            "clearCache" => {
                manager.invalidate_cache(resource_type);
                Ok(Value::Bool(true))
            }
            other => Err(ResourceError::UnknownMethod(format!(
                "{}.{}",
                resource_type, other
            ))),
        }
    }

    // ---- typed helpers ----

    pub async fn get_all<T: DeserializeOwned>(&self, params: Params, force_refresh: bool) -> Result<Vec<T>> {
        let args = MethodArgs::new().params(params).force_refresh(force_refresh);
        decode(self.invoke("getAll", args).await?)
    }

    pub async fn get_by_id<T: DeserializeOwned>(
        &self,
        id: impl Into<ResourceId>,
        force_refresh: bool,
    ) -> Result<T> {
        let args = MethodArgs::new().id(id).force_refresh(force_refresh);
        decode(self.invoke("getById", args).await?)
    }

    pub async fn create<T: DeserializeOwned>(&self, data: &impl Serialize) -> Result<T> {
        let args = MethodArgs::new().data(serde_json::to_value(data)?);
        decode(self.invoke("create", args).await?)
    }

    pub async fn update<T: DeserializeOwned>(
        &self,
        id: impl Into<ResourceId>,
        data: &impl Serialize,
    ) -> Result<T> {
        let args = MethodArgs::new().id(id).data(serde_json::to_value(data)?);
        decode(self.invoke("update", args).await?)
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        id: impl Into<ResourceId>,
        data: &impl Serialize,
    ) -> Result<T> {
        let args = MethodArgs::new().id(id).data(serde_json::to_value(data)?);
        decode(self.invoke("patch", args).await?)
    }

    pub async fn delete(&self, id: impl Into<ResourceId>) -> Result<()> {
        self.invoke("delete", MethodArgs::new().id(id)).await.map(|_| ())
    }

    pub async fn refresh_all<T: DeserializeOwned>(&self, params: Params) -> Result<Vec<T>> {
        decode(self.invoke("refreshAll", MethodArgs::new().params(params)).await?)
    }

    pub async fn refresh_by_id<T: DeserializeOwned>(&self, id: impl Into<ResourceId>) -> Result<T> {
        decode(self.invoke("refreshById", MethodArgs::new().id(id)).await?)
    }

    pub async fn clear_cache(&self) -> Result<bool> {
        decode(self.invoke("clearCache", MethodArgs::new()).await?)
    }
}

impl std::fmt::Debug for ResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut custom: Vec<&String> = self.custom.keys().collect();
        custom.sort();
        f.debug_struct("ResourceService")
            .field("resource_type", &self.resource_type)
            .field("custom", &custom)
            .finish()
    }
}

/// Builder returned by [`ResourceService::builder`]
pub struct ServiceBuilder {
    service: ResourceService,
}

impl ServiceBuilder {
    /// Register a named method; the last registration of a name wins
    pub fn method<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(MethodArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let method: CustomMethod =
            Arc::new(move |args| -> BoxFuture<'static, Result<Value>> { Box::pin(f(args)) });
        self.service.custom.insert(name.into(), method);
        self
    }

    pub fn build(self) -> ResourceService {
        self.service
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Method, MockHttpClient};
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Area {
        id: u64,
        name: String,
    }

    fn manager(mock: MockHttpClient) -> Arc<ResourceManager> {
        Arc::new(ResourceManager::new(Arc::new(mock)))
    }

    #[tokio::test]
    async fn test_standard_methods_delegate() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .withf(|req| req.method == Method::Get && req.url == "/api/areas/")
            .times(2)
            .returning(|_| Ok(json!([{"id": 1, "name": "Lab"}])));
        mock.expect_request()
            .withf(|req| req.method == Method::Get && req.url == "/api/areas/1/")
            .times(1)
            .returning(|_| Ok(json!({"id": 1, "name": "Lab"})));

        let service = ResourceService::new("areas", manager(mock));

        let all: Vec<Area> = service.get_all(Params::new(), false).await.unwrap();
        assert_eq!(all, vec![Area { id: 1, name: "Lab".into() }]);

        let cached: Vec<Area> = service.get_all(Params::new(), false).await.unwrap();
        assert_eq!(cached.len(), 1);

        let refreshed: Vec<Area> = service.refresh_all(Params::new()).await.unwrap();
        assert_eq!(refreshed.len(), 1);

        let one: Area = service.get_by_id(1, false).await.unwrap();
        assert_eq!(one.name, "Lab");

        assert!(service.clear_cache().await.unwrap());
        assert!(service.manager().cache_keys().is_empty());
    }

    #[tokio::test]
    async fn test_custom_method_added_and_overrides_standard() {
        let service = ResourceService::builder("areas", manager(MockHttpClient::new()))
            .method("getPopularAreas", |args: MethodArgs| async move {
                Ok::<_, ResourceError>(json!({"count": args.params.get("count").cloned()}))
            })
            .method("getAll", |_args| async { Ok::<_, ResourceError>(json!([{"id": 42, "name": "Custom"}])) })
            .build();

        let popular = service
            .invoke("getPopularAreas", MethodArgs::new().params(Params::new().with("count", 3)))
            .await
            .unwrap();
        assert_eq!(popular, json!({"count": 3}));

        // The typed helper sees the override too
        let all: Vec<Area> = service.get_all(Params::new(), false).await.unwrap();
        assert_eq!(all, vec![Area { id: 42, name: "Custom".into() }]);

        assert!(service.has_method("getPopularAreas"));
        assert_eq!(service.method_names().len(), STANDARD_METHODS.len() + 1);
    }

    #[tokio::test]
    async fn test_later_registration_wins() {
        let service = ResourceService::builder("areas", manager(MockHttpClient::new()))
            .method("ping", |_| async { Ok::<_, ResourceError>(json!(1)) })
            .method("ping", |_| async { Ok::<_, ResourceError>(json!(2)) })
            .build();

        assert_eq!(service.invoke("ping", MethodArgs::new()).await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_errors_propagate_untouched() {
        let mut mock = MockHttpClient::new();
        mock.expect_request()
            .returning(|_| Err(ResourceError::Unavailable("offline".into())));

        let service = ResourceService::new("areas", manager(mock));

        let err = service.delete(3).await.unwrap_err();
        assert!(matches!(err, ResourceError::Unavailable(_)));

        let err = service.invoke("getById", MethodArgs::new()).await.unwrap_err();
        assert!(matches!(err, ResourceError::InvalidArgument(_)));

        let err = service.invoke("nope", MethodArgs::new()).await.unwrap_err();
        assert!(matches!(err, ResourceError::UnknownMethod(_)));
    }
}
