// ── Query cache ──
//
// Keyed, type-erased storage for query results with push-based change
// notification via a `watch` channel. Mutations invalidate keys; the next
// read refetches.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::trace;

/// Identifies one cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Customers,
    Jobs,
    Job(String),
    JobLogs(String),
    Tasks,
    TaskContent(String),
    Bundles,
    Bundle(String),
}

impl QueryKey {
    /// Whether this key belongs to the job family (list, detail, logs).
    pub fn is_job(&self) -> bool {
        matches!(self, Self::Jobs | Self::Job(_) | Self::JobLogs(_))
    }

    /// Whether this key belongs to the bundle family (list, detail).
    pub fn is_bundle(&self) -> bool {
        matches!(self, Self::Bundles | Self::Bundle(_))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customers => f.write_str("customers"),
            Self::Jobs => f.write_str("jobs"),
            Self::Job(id) => write!(f, "jobs/{id}"),
            Self::JobLogs(id) => write!(f, "jobs/{id}/logs"),
            Self::Tasks => f.write_str("tasks"),
            Self::TaskContent(id) => write!(f, "tasks/{id}/content"),
            Self::Bundles => f.write_str("bundles"),
            Self::Bundle(id) => write!(f, "bundles/{id}"),
        }
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Concurrent cache of query results.
///
/// Every insert or invalidation bumps a version counter that subscribers
/// can watch to know when to re-read.
pub struct QueryCache {
    entries: DashMap<QueryKey, Entry>,
    version: watch::Sender<u64>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        Self {
            entries: DashMap::new(),
            version,
        }
    }

    /// Cached value for `key`, if present and of type `T`.
    pub fn get<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entry = Arc::clone(self.entries.get(key)?.value());
        entry.downcast::<T>().ok()
    }

    /// Store a query result.
    pub fn insert<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) -> Arc<T> {
        let value = Arc::new(value);
        let entry: Entry = Arc::clone(&value) as Entry;
        trace!(%key, "cache insert");
        self.entries.insert(key, entry);
        self.bump_version();
        value
    }

    /// Drop one key. Returns `true` if it was cached.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            trace!(%key, "cache invalidate");
            self.bump_version();
        }
        removed
    }

    /// Drop every key matching `predicate`. Returns how many were dropped.
    pub fn invalidate_where(&self, predicate: impl Fn(&QueryKey) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !predicate(key));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.bump_version();
        }
        removed
    }

    /// Remove everything (e.g. on sign-out).
    pub fn clear(&self) {
        self.entries.clear();
        self.bump_version();
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current version counter.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Subscribe to version changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_typed() {
        let cache = QueryCache::new();
        cache.insert(QueryKey::Tasks, vec![1u32, 2, 3]);

        let hit = cache.get::<Vec<u32>>(&QueryKey::Tasks).unwrap();
        assert_eq!(*hit, vec![1, 2, 3]);
        assert!(cache.get::<String>(&QueryKey::Tasks).is_none());
        assert!(cache.get::<Vec<u32>>(&QueryKey::Jobs).is_none());
    }

    #[test]
    fn invalidate_bumps_version_only_when_present() {
        let cache = QueryCache::new();
        cache.insert(QueryKey::Customers, ());
        let v = cache.version();

        assert!(cache.invalidate(&QueryKey::Customers));
        assert_eq!(cache.version(), v + 1);
        assert!(!cache.invalidate(&QueryKey::Customers));
        assert_eq!(cache.version(), v + 1);
    }

    #[test]
    fn invalidate_where_drops_a_family() {
        let cache = QueryCache::new();
        cache.insert(QueryKey::Jobs, ());
        cache.insert(QueryKey::Job("j1".into()), ());
        cache.insert(QueryKey::JobLogs("j1".into()), ());
        cache.insert(QueryKey::Tasks, ());

        assert_eq!(cache.invalidate_where(QueryKey::is_job), 3);
        assert!(cache.contains(&QueryKey::Tasks));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let cache = QueryCache::new();
        let mut rx = cache.subscribe();
        cache.insert(QueryKey::Bundles, ());
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
    }
}
