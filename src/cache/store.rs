use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::types::{CacheEntry, CacheEntryInfo};

/// In-memory response cache keyed by string
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    clock: Arc<dyn Clock>,
    hits: usize,
    misses: usize,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a key. Expired entries are only returned with `allow_expired`.
    pub fn get(&mut self, key: &str, allow_expired: bool) -> Option<Value> {
        let now = self.clock.now();
        let found = self
            .entries
            .get(key)
            .filter(|entry| allow_expired || !entry.is_expired(now))
            .map(|entry| entry.data.clone());

        // Stale rescues are not lookups in the hit-rate sense
        if !allow_expired {
            if found.is_some() {
                self.hits += 1;
            } else {
                self.misses += 1;
            }
        }

        found
    }

    /// Store (or overwrite) a value
    pub fn set(&mut self, key: impl Into<String>, data: Value, ttl: Duration) {
        let entry = CacheEntry::new(data, self.clock.now(), ttl);
        self.entries.insert(key.into(), entry);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a single key
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every key starting with `prefix`, returning how many went
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }

    /// Drop everything, including counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted list of keys currently held
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn entries(&self) -> Vec<CacheEntryInfo> {
        let now = self.clock.now();
        let mut infos: Vec<CacheEntryInfo> = self
            .entries
            .iter()
            .map(|(key, entry)| CacheEntryInfo {
                key: key.clone(),
                stored_at: entry.stored_at_utc,
                ttl: entry.ttl,
                expired: entry.is_expired(now),
            })
            .collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let expired = self.entries.values().filter(|e| e.is_expired(now)).count();
        let total_requests = self.hits + self.misses;
        let hit_rate = if total_requests > 0 {
            (self.hits as f32 / total_requests as f32) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.entries.len(),
            expired_entries: expired,
            cache_hits: self.hits,
            cache_misses: self.misses,
            hit_rate,
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub expired_entries: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub hit_rate: f32,
}

impl CacheStats {
    /// Format cache stats for display
    pub fn format(&self) -> String {
        format!(
            "Cache Statistics:\n\
            📦 Entries: {} ({} expired)\n\
            ✅ Hit Rate: {:.1}% ({} hits, {} misses)",
            self.entries,
            self.expired_entries,
            self.hit_rate,
            self.cache_hits,
            self.cache_misses
        )
    }
}
