// Gateway module for services - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod areas;
mod custom_call;
mod local_terminal;
mod notices;
mod registry;
mod telemetry;
mod terminals;
mod users;

// Public re-exports - the ONLY way to access service functionality
pub use areas::{AreaPage, AreaService, BuildingAreas, BuildingService};
pub use custom_call::CustomCall;
pub use local_terminal::{EnvironmentFeatures, EnvironmentInfo, LocalTerminalService};
pub use notices::{AlertService, NoticeService, SummaryService, UploadService};
pub use registry::{default_cache_duration, ApiServices};
pub use telemetry::{
    Co2Reading, Co2Service, HistoricalService, TemperatureHumidityReading,
    TemperatureHumidityService,
};
pub use terminals::{NodeService, TerminalService};
pub use users::{AuthService, NoAuth, PasswordChange, UserService};

#[cfg(test)]
pub use users::MockAuthService;
