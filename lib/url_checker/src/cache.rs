use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMethod {
    Head,
    Get,
}

#[derive(Debug, Clone)]
pub struct UrlCheckRecord {
    pub accessible: bool,
    pub status: Option<u16>,
    pub method: CheckMethod,
    pub checked_at: DateTime<Utc>,
}

/// TTL cache of check outcomes keyed by the exact URL string. The clock is
/// injected so expiry is testable without waiting out the TTL.
pub struct UrlCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, UrlCheckRecord>>,
}

impl UrlCache {
    pub fn new(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> UrlCache {
        UrlCache {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::minutes(5)),
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<UrlCheckRecord> {
        let mut entries = self.entries.lock().unwrap();
        let record = entries.get(key)?;
        if self.expired(record) {
            // Drop the stale record so the map does not grow without bound in
            // a long-lived process.
            entries.remove(key);
            None
        } else {
            Some(record.clone())
        }
    }

    pub fn set(&self, key: &str, record: UrlCheckRecord) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, existing| !self.expired(existing));
        entries.insert(key.to_string(), record);
    }

    /// Number of records physically held, expired ones included until the
    /// next `get` or `set` evicts them.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_expired(&self, key: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(record) => self.expired(record),
            None => true,
        }
    }

    fn expired(&self, record: &UrlCheckRecord) -> bool {
        self.clock.now() - record.checked_at > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub struct FixedClock {
        pub now: Mutex<DateTime<Utc>>,
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let start = Utc::now();
        let clock = Arc::new(FixedClock {
            now: Mutex::new(start),
        });
        let cache = UrlCache::new(std::time::Duration::from_secs(300), clock.clone());
        cache.set(
            "https://example.org/data.csv",
            UrlCheckRecord {
                accessible: true,
                status: Some(200),
                method: CheckMethod::Head,
                checked_at: start,
            },
        );
        assert!(cache.get("https://example.org/data.csv").is_some());
        assert!(!cache.is_expired("https://example.org/data.csv"));

        *clock.now.lock().unwrap() = start + Duration::seconds(301);
        assert!(cache.get("https://example.org/data.csv").is_none());
        assert!(cache.is_expired("https://example.org/data.csv"));
        assert!(cache.is_expired("https://example.org/never-checked"));
    }

    #[test]
    fn test_expired_records_are_evicted() {
        let start = Utc::now();
        let clock = Arc::new(FixedClock {
            now: Mutex::new(start),
        });
        let cache = UrlCache::new(std::time::Duration::from_secs(300), clock.clone());
        let record = UrlCheckRecord {
            accessible: true,
            status: Some(200),
            method: CheckMethod::Head,
            checked_at: start,
        };
        cache.set("https://example.org/a", record.clone());
        cache.set("https://example.org/b", record.clone());
        assert_eq!(cache.len(), 2);

        *clock.now.lock().unwrap() = start + Duration::seconds(301);
        // A miss on an expired key removes it.
        assert!(cache.get("https://example.org/a").is_none());
        assert_eq!(cache.len(), 1);
        // A set sweeps whatever else has expired. Read the clock into a local
        // first: holding the FixedClock lock across `set` would deadlock when
        // the sweep calls `Clock::now`.
        let now = *clock.now.lock().unwrap();
        cache.set(
            "https://example.org/c",
            UrlCheckRecord {
                checked_at: now,
                ..record
            },
        );
        assert_eq!(cache.len(), 1);
        assert!(cache.get("https://example.org/c").is_some());
    }
}
