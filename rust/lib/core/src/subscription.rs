//! Observer plumbing shared by the state store and the collaborators.
//!
//! A producer keeps a [`Sinks`] table; each consumer gets back a
//! [`Subscription`] handle. Releasing the handle (explicitly through
//! [`Subscription::unsubscribe`] or by dropping it) removes the sink, so
//! a screen that owns its handle can never leak a live listener.

use std::sync::{Arc, Mutex, Weak};

/// Release hook run exactly once when a subscription ends.
type Release = Box<dyn FnOnce() + Send + Sync>;

/// Handle for one live registration. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Release>,
}

impl Subscription {
    /// Wrap a release hook.
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn detached() -> Self {
        Self { release: None }
    }

    /// Release the registration now.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    /// Whether the release hook has not run yet.
    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Callback receiving events of type `E`.
pub type Sink<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Producer-side table of sinks.
///
/// Sinks are invoked outside the table lock, so a sink may subscribe or
/// unsubscribe (including itself) while being called.
pub struct Sinks<E> {
    table: Arc<Mutex<SinkTable<E>>>,
}

struct SinkTable<E> {
    next_id: u64,
    entries: Vec<(u64, Sink<E>)>,
}

impl<E: 'static> Sinks<E> {
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(SinkTable {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a sink. The returned handle removes it again.
    pub fn add(&self, sink: Sink<E>) -> Subscription {
        let id = {
            let mut table = self.table.lock().expect("sink table poisoned");
            let id = table.next_id;
            table.next_id += 1;
            table.entries.push((id, sink));
            id
        };
        let weak: Weak<Mutex<SinkTable<E>>> = Arc::downgrade(&self.table);
        Subscription::new(move || {
            if let Some(table) = weak.upgrade() {
                if let Ok(mut table) = table.lock() {
                    table.entries.retain(|(entry_id, _)| *entry_id != id);
                }
            }
        })
    }

    /// Deliver an event to every registered sink, in registration order.
    pub fn emit(&self, event: &E) {
        let sinks: Vec<Sink<E>> = {
            let table = self.table.lock().expect("sink table poisoned");
            table.entries.iter().map(|(_, s)| Arc::clone(s)).collect()
        };
        for sink in sinks {
            sink(event);
        }
    }

    /// Number of live sinks.
    pub fn len(&self) -> usize {
        self.table.lock().expect("sink table poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for Sinks<E> {
    fn default() -> Self {
        Self::new()
    }
}
