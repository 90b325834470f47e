use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;

use crate::{
    endpoint::{GameType, ServerEndpoint},
    status::ProbeResult,
};

/// Where the cache gets the current time from. Tests use [`ManualClock`] so
/// they don't have to sleep through a ttl.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub game_type: GameType,
    pub host: String,
    pub port: u16,
}

impl From<&ServerEndpoint> for CacheKey {
    fn from(endpoint: &ServerEndpoint) -> Self {
        Self {
            game_type: endpoint.game_type.clone(),
            host: endpoint.host.clone(),
            port: endpoint.port,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: ProbeResult,
    pub captured_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.captured_at) < ttl
    }

    /// The cached result as it should be handed to callers.
    pub fn to_result(&self) -> ProbeResult {
        ProbeResult {
            captured_at: Some(self.captured_at),
            ..self.result.clone()
        }
    }

    /// The cached result, but marked as offline and out of date.
    pub fn to_stale_result(&self, error: &str, marker: &str) -> ProbeResult {
        ProbeResult {
            online: false,
            stale: true,
            error: Some(format!("{error} ({marker})")),
            captured_at: Some(self.captured_at),
            ..self.result.clone()
        }
    }
}

/// Status results we've already fetched, so we don't hammer servers.
///
/// There's no request coalescing, if two probes for the same server miss at
/// the same time they both go to the network and whichever finishes last is
/// what ends up cached.
pub struct ResultCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The cached entry, if it hasn't expired yet.
    pub fn get_fresh(&self, key: &CacheKey) -> Option<CacheEntry> {
        let now = self.clock.now();
        self.entries
            .lock()
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .cloned()
    }

    /// The cached entry whether or not it's expired.
    pub fn get_any(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    /// Replace whatever was cached for the key.
    pub fn insert(&self, key: CacheKey, result: ProbeResult) -> CacheEntry {
        let entry = CacheEntry {
            result,
            captured_at: self.clock.now(),
            ttl: self.ttl,
        };
        self.entries.lock().insert(key, entry.clone());
        entry
    }

    /// What to return when a probe failed without getting any data: the last
    /// thing we knew about the server marked as stale, or just the error.
    pub fn stale_or_offline(&self, key: &CacheKey, error: &str, marker: &str) -> ProbeResult {
        match self.get_any(key) {
            Some(entry) => entry.to_stale_result(error, marker),
            None => ProbeResult::offline(error),
        }
    }

    pub fn remove(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().remove(key)
    }

    /// Drop every expired entry. Note that this means we won't have stale data
    /// to fall back on for those servers anymore.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
