use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;

use crate::resources::ResourceService;
use crate::utils::{log_error, ResourceError, Result};

/// Password change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub re_new_password: String,
}

/// Authentication collaborator owned by the embedding application
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn user_info(&self) -> Result<Value>;

    async fn update_user_info(&self, data: Value) -> Result<Value>;

    async fn update_password(&self, change: PasswordChange) -> Result<Value>;
}

/// Stand-in used when no authentication is wired up
#[derive(Debug, Default, Clone)]
pub struct NoAuth;

#[async_trait]
impl AuthService for NoAuth {
    async fn user_info(&self) -> Result<Value> {
        Err(ResourceError::Auth("no authentication service configured".into()))
    }

    async fn update_user_info(&self, _data: Value) -> Result<Value> {
        Err(ResourceError::Auth("no authentication service configured".into()))
    }

    async fn update_password(&self, _change: PasswordChange) -> Result<Value> {
        Err(ResourceError::Auth("no authentication service configured".into()))
    }
}

/// `users` resource plus account operations routed through the auth service
#[derive(Clone)]
pub struct UserService {
    resource: ResourceService,
    auth: Arc<dyn AuthService>,
    current: Arc<RwLock<Option<Value>>>,
}

impl UserService {
    pub fn new(resource: ResourceService, auth: Arc<dyn AuthService>) -> Self {
        Self {
            resource,
            auth,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Fetch the signed-in user and remember it
    pub async fn user_info(&self) -> Result<Value> {
        match self.auth.user_info().await {
            Ok(user) => {
                *self.current.write() = Some(user.clone());
                Ok(user)
            }
            Err(e) => {
                log_error("❌", format!("Failed to load user info: {}", e));
                Err(e)
            }
        }
    }

    /// Last user loaded by [`UserService::user_info`]
    pub fn current_user(&self) -> Option<Value> {
        self.current.read().clone()
    }

    pub async fn update_user_info(&self, data: Value) -> Result<Value> {
        self.auth.update_user_info(data).await.inspect_err(|e| {
            log_error("❌", format!("Failed to update user info: {}", e));
        })
    }

    pub async fn update_password(&self, change: PasswordChange) -> Result<Value> {
        self.auth.update_password(change).await.inspect_err(|e| {
            log_error("❌", format!("Failed to update password: {}", e));
        })
    }
}

impl Deref for UserService {
    type Target = ResourceService;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockHttpClient;
    use crate::resources::ResourceManager;
    use serde_json::json;

    fn users(auth: MockAuthService) -> UserService {
        let manager = Arc::new(ResourceManager::new(Arc::new(MockHttpClient::new())));
        UserService::new(ResourceService::new("users", manager), Arc::new(auth))
    }

    #[tokio::test]
    async fn test_user_info_is_remembered() {
        let mut auth = MockAuthService::new();
        auth.expect_user_info()
            .times(1)
            .returning(|| Ok(json!({"id": 1, "favorite_areas": [2]})));

        let service = users(auth);
        assert!(service.current_user().is_none());

        service.user_info().await.unwrap();
        assert_eq!(service.current_user(), Some(json!({"id": 1, "favorite_areas": [2]})));
    }

    #[tokio::test]
    async fn test_auth_errors_propagate() {
        let mut auth = MockAuthService::new();
        auth.expect_update_password()
            .returning(|_| Err(ResourceError::Auth("bad password".into())));

        let service = users(auth);
        let change = PasswordChange {
            current_password: "old".into(),
            new_password: "new".into(),
            re_new_password: "new".into(),
        };

        assert!(matches!(
            service.update_password(change).await,
            Err(ResourceError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_no_auth_refuses() {
        assert!(NoAuth.user_info().await.is_err());
    }
}
