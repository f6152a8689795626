use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Cache entry holding a response body and its freshness window
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub stored_at: Instant,
    /// Wall-clock time of the store, for display only
    pub stored_at_utc: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(data: Value, stored_at: Instant, ttl: Duration) -> Self {
        Self {
            data,
            stored_at,
            stored_at_utc: Utc::now(),
            ttl,
        }
    }

    /// An entry is expired once its age strictly exceeds the ttl
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

/// Summary of one cached key, for inspection
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub key: String,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
    pub expired: bool,
}
