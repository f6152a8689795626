// Gateway module for api - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod rest;
mod traits;
mod types;

// Public re-exports - the ONLY way to access api functionality
pub use rest::RestClient;
pub use traits::HttpClient;
pub use types::{value_to_query, ApiRequest, Method, Params, ResourceId};

#[cfg(test)]
pub use traits::MockHttpClient;
