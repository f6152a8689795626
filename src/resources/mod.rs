// Gateway module for resources - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod config;
mod manager;
mod service;

// Public re-exports - the ONLY way to access resource functionality
pub use config::ResourceConfig;
pub use manager::{normalize_list, CustomRequest, ResourceManager};
pub use service::{CustomMethod, MethodArgs, ResourceService, ServiceBuilder, STANDARD_METHODS};
