/// Constants module to avoid magic numbers in the codebase

// Network Configuration
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_LOCAL_TERMINAL_URL: &str = "http://localhost:5000";
pub const DEFAULT_BASE_PATH: &str = "/api";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const LOCAL_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const LOCAL_HEARTBEAT_TIMEOUT_MS: u64 = 3_000;

// Cache durations (milliseconds)
pub const MANAGER_DEFAULT_CACHE_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_GLOBAL_CACHE_MS: u64 = 2 * 60 * 1000;
pub const SHORT_CACHE_MS: u64 = 30 * 1000;
pub const NODE_DATA_CACHE_MS: u64 = 5 * 1000;
pub const REFERENCE_CACHE_MS: u64 = 5 * 60 * 1000;

/// Default cache duration per known resource type
pub const DEFAULT_CACHE_DURATIONS: &[(&str, u64)] = &[
    ("areas", 60 * 1000),
    ("buildings", 5 * 60 * 1000),
    ("nodes", 30 * 1000),
    ("terminals", 30 * 1000),
    ("alerts", 30 * 1000),
    ("notice", 60 * 1000),
    ("users", 5 * 60 * 1000),
    ("historical", 5 * 60 * 1000),
    ("temperature-humidity", 2 * 60 * 1000),
    ("co2", 2 * 60 * 1000),
];

// Service defaults
pub const DEFAULT_POPULAR_COUNT: u32 = 5;
pub const DEFAULT_SUGGEST_BUILDING: u64 = 2;
pub const DEFAULT_LATEST_COUNT: u32 = 10;
pub const DEFAULT_HOURS: u32 = 24;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
