pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod constants;
pub mod resources;
pub mod services;
pub mod utils;

pub use api::{HttpClient, Method, Params, ResourceId, RestClient};
pub use app::{load_config, Config};
pub use resources::{ResourceConfig, ResourceManager, ResourceService};
pub use services::{ApiServices, CustomCall};
pub use utils::{ResourceError, Result};
