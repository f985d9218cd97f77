use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Clock abstraction so cache expiry can be driven manually in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default clock backed by the system monotonic clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A manually advanced clock for tests.
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = lock_or_recover(&self.now);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *lock_or_recover(&self.now)
    }
}

struct Entry {
    inserted: Instant,
    value: serde_json::Value,
}

/// Time-bounded memoization keyed by operation name plus serialized
/// parameters.
///
/// Values are stored as JSON snapshots; concurrent requests for the same key
/// share one computed result for the duration of the window. There is no
/// size bound and no eviction other than expiry-on-read.
pub struct TtlCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Build a cache key from an operation name and its parameters.
    pub fn key<P: Serialize>(operation: &str, params: &P) -> String {
        let params = serde_json::to_string(params).unwrap_or_else(|_| "?".to_string());
        format!("{operation}:{params}")
    }

    /// Fetch a still-valid snapshot, if any. Expired entries are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = lock_or_recover(&self.entries);
        let entry = entries.get(key)?;
        if self.clock.now().duration_since(entry.inserted) >= self.ttl {
            entries.remove(key);
            tracing::debug!("cache expired: {key}");
            return None;
        }
        tracing::debug!("cache hit: {key}");
        serde_json::from_value(entry.value.clone()).ok()
    }

    /// Store a snapshot. Serialization failures drop the entry silently; the
    /// cache is an optimization, never a source of truth.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        let mut entries = lock_or_recover(&self.entries);
        entries.insert(
            key.to_string(),
            Entry {
                inserted: self.clock.now(),
                value,
            },
        );
    }
}

/// A poisoned lock only means a panic happened mid-insert; the cached
/// snapshots themselves are always whole values.
fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_window() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.put("k", &vec!["a".to_string(), "b".to_string()]);
        let got: Option<Vec<String>> = cache.get("k");
        assert_eq!(got, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let got: Option<u32> = cache.get("absent");
        assert!(got.is_none());
    }

    #[test]
    fn test_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock.clone());
        cache.put("k", &1u32);

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get::<u32>("k"), Some(1));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get::<u32>("k"), None);
    }

    #[test]
    fn test_put_refreshes_window() {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(Duration::from_secs(60), clock.clone());
        cache.put("k", &1u32);

        clock.advance(Duration::from_secs(45));
        cache.put("k", &2u32);

        clock.advance(Duration::from_secs(45));
        assert_eq!(cache.get::<u32>("k"), Some(2));
    }

    #[test]
    fn test_key_includes_params() {
        let a = TtlCache::key("list_posts", &serde_json::json!({"tag": "Design"}));
        let b = TtlCache::key("list_posts", &serde_json::json!({"tag": "AI"}));
        assert_ne!(a, b);
        assert!(a.starts_with("list_posts:"));
    }
}
