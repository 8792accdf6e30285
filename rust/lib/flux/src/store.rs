use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, Weak};

use serde::Serialize;
use statusboard_core::Subscription;

use crate::pattern::TopicPattern;
use crate::value::StateValue;

/// Callback type for state change notifications.
pub type ChangeHandler = Arc<dyn Fn(&str, &StateValue) + Send + Sync>;

/// Per-path state store with pattern-routed change notifications.
///
/// - `set(path, value)` stores a value and notifies matching subscribers.
/// - `get(path)` reads the current value (Arc clone, cheap).
/// - `get_as::<T>(path)` reads and clones a typed value.
/// - `scan(prefix)` lists all children under a prefix path.
/// - `subscribe(pattern, handler)` registers a change handler and returns
///   the [`Subscription`] that keeps it alive.
pub struct StateStore {
    /// Current state values, keyed by exact path. BTreeMap for ordered scan.
    values: RwLock<BTreeMap<String, StateValue>>,
    /// Registered change handlers.
    watchers: Arc<RwLock<Watchers>>,
}

struct Watchers {
    next_id: u64,
    entries: Vec<Watcher>,
}

struct Watcher {
    id: u64,
    pattern: TopicPattern,
    handler: ChangeHandler,
}

impl StateStore {
    /// Create a new empty StateStore.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            watchers: Arc::new(RwLock::new(Watchers {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    /// Set a typed value at the given path and notify matching subscribers.
    pub fn set<T: Any + Send + Sync + Serialize>(&self, path: &str, value: T) {
        self.set_value(path, StateValue::new(value));
    }

    /// Set a pre-built StateValue at the given path and notify matching subscribers.
    ///
    /// Handlers run on the caller's thread after the write lock is released,
    /// so a handler may read the store (or write to it) freely.
    pub fn set_value(&self, path: &str, value: StateValue) {
        {
            let mut values = self.values.write().expect("state store poisoned");
            values.insert(path.to_string(), value.clone());
        }
        for handler in self.matching_handlers(path) {
            handler(path, &value);
        }
    }

    /// Get the current state value at the given path.
    pub fn get(&self, path: &str) -> Option<StateValue> {
        let values = self.values.read().expect("state store poisoned");
        values.get(path).cloned()
    }

    /// Get a typed clone of the value at `path`.
    ///
    /// Returns `None` if the path is empty or holds a different type.
    pub fn get_as<T: Any + Clone>(&self, path: &str) -> Option<T> {
        self.get(path).and_then(|v| v.downcast_ref::<T>().cloned())
    }

    /// Read-modify-write a typed value, starting from `init` when the path
    /// is empty. Subscribers see the new value.
    ///
    /// The write lock is held from the read to the store, so concurrent
    /// updates of one path never lose each other's changes. `init` and `f`
    /// run under that lock and must not touch the store.
    pub fn update<T, I, F>(&self, path: &str, init: I, f: F) -> T
    where
        T: Any + Clone + Send + Sync + Serialize,
        I: FnOnce() -> T,
        F: FnOnce(&mut T),
    {
        self.read_modify_write(path, init, |current: &mut T| {
            f(current);
            (true, current.clone())
        })
    }

    /// Like [`update`](Self::update), but `f` decides whether to commit.
    ///
    /// When `f` returns `false` the stored value is left untouched and no
    /// subscriber is notified. Returns what `f` returned, so exactly one of
    /// several racing callers wins a claim on a flag.
    pub fn update_if<T, I, F>(&self, path: &str, init: I, f: F) -> bool
    where
        T: Any + Clone + Send + Sync + Serialize,
        I: FnOnce() -> T,
        F: FnOnce(&mut T) -> bool,
    {
        self.read_modify_write(path, init, |current: &mut T| {
            let commit = f(current);
            (commit, commit)
        })
    }

    fn read_modify_write<T, I, F, R>(&self, path: &str, init: I, f: F) -> R
    where
        T: Any + Clone + Send + Sync + Serialize,
        I: FnOnce() -> T,
        F: FnOnce(&mut T) -> (bool, R),
    {
        let (value, out) = {
            let mut values = self.values.write().expect("state store poisoned");
            let mut current = values
                .get(path)
                .and_then(|v| v.downcast_ref::<T>().cloned())
                .unwrap_or_else(init);
            let (commit, out) = f(&mut current);
            if !commit {
                return out;
            }
            let value = StateValue::new(current);
            values.insert(path.to_string(), value.clone());
            (value, out)
        };
        for handler in self.matching_handlers(path) {
            handler(path, &value);
        }
        out
    }

    /// Remove the state value at the given path.
    ///
    /// Returns the old value if present. Does NOT notify subscribers.
    pub fn remove(&self, path: &str) -> Option<StateValue> {
        let mut values = self.values.write().expect("state store poisoned");
        values.remove(path)
    }

    /// Scan all entries whose path starts with `{prefix}/`, ordered by path.
    ///
    /// Does NOT include the exact `prefix` path itself: only children.
    pub fn scan(&self, prefix: &str) -> Vec<(String, StateValue)> {
        let values = self.values.read().expect("state store poisoned");
        let scan_prefix = format!("{}/", prefix);
        values
            .range(scan_prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&scan_prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Check if a value exists at the given path.
    pub fn contains(&self, path: &str) -> bool {
        let values = self.values.read().expect("state store poisoned");
        values.contains_key(path)
    }

    /// Get the total number of stored paths.
    pub fn len(&self) -> usize {
        let values = self.values.read().expect("state store poisoned");
        values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to state changes matching the given pattern.
    ///
    /// The handler is called synchronously whenever `set` or `set_value`
    /// writes a matching path. It stays registered until the returned
    /// handle is dropped or unsubscribed.
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> Subscription
    where
        F: Fn(&str, &StateValue) + Send + Sync + 'static,
    {
        let id = {
            let mut watchers = self.watchers.write().expect("watchers poisoned");
            let id = watchers.next_id;
            watchers.next_id += 1;
            watchers.entries.push(Watcher {
                id,
                pattern: TopicPattern::parse(pattern),
                handler: Arc::new(handler),
            });
            id
        };
        let weak: Weak<RwLock<Watchers>> = Arc::downgrade(&self.watchers);
        Subscription::new(move || {
            if let Some(watchers) = weak.upgrade() {
                if let Ok(mut watchers) = watchers.write() {
                    watchers.entries.retain(|w| w.id != id);
                }
            }
        })
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.watchers.read().expect("watchers poisoned").entries.len()
    }

    /// Get a snapshot of all paths and values, ordered by path.
    pub fn snapshot(&self) -> Vec<(String, StateValue)> {
        let values = self.values.read().expect("state store poisoned");
        values.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Get all paths currently stored.
    pub fn paths(&self) -> Vec<String> {
        let values = self.values.read().expect("state store poisoned");
        values.keys().cloned().collect()
    }

    fn matching_handlers(&self, path: &str) -> Vec<ChangeHandler> {
        let watchers = self.watchers.read().expect("watchers poisoned");
        watchers
            .entries
            .iter()
            .filter(|w| w.pattern.matches(path))
            .map(|w| Arc::clone(&w.handler))
            .collect()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
