use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use statusboard_core::Subscription;

use crate::router::{Payload, Router};
use crate::store::StateStore;
use crate::value::StateValue;

/// Flux: the state engine behind every status board screen.
///
/// Three primitives, all path-based:
/// - `get(path)`: read state at a path (Arc, zero-copy)
/// - `emit(path, payload)`: send a request, routed to matching handler(s)
/// - `subscribe(pattern)`: observe state changes, pattern-matched
///
/// # Examples
///
/// ```ignore
/// let flux = Flux::new();
///
/// flux.on("auth/sign-in", |_, payload, store| async move {
///     store.set("app/route", AppRoute::feed());
/// });
///
/// let _sub = flux.subscribe("app/route", |path, value| {
///     println!("{} changed", path);
/// });
///
/// flux.emit("auth/sign-in", SignInReq { .. }).await;
/// let route = flux.get("app/route").unwrap();
/// ```
pub struct Flux {
    store: Arc<StateStore>,
    router: Router,
}

impl Flux {
    /// Create a new Flux instance with empty state and no handlers.
    pub fn new() -> Self {
        Self {
            store: Arc::new(StateStore::new()),
            router: Router::new(),
        }
    }

    // ====================================================================
    // State: read
    // ====================================================================

    /// Read the state value at a path.
    ///
    /// The returned `StateValue` is an Arc clone. Caller can downcast:
    ///
    /// ```ignore
    /// let v = flux.get("auth/state")?;
    /// let auth = v.downcast_ref::<AuthState>()?;
    /// ```
    pub fn get(&self, path: &str) -> Option<StateValue> {
        self.store.get(path)
    }

    /// Typed clone of the state at a path.
    pub fn get_as<T: Any + Clone>(&self, path: &str) -> Option<T> {
        self.store.get_as(path)
    }

    /// Scan all state entries under a prefix path, ordered by path.
    pub fn scan(&self, prefix: &str) -> Vec<(String, StateValue)> {
        self.store.scan(prefix)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.store.contains(path)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn snapshot(&self) -> Vec<(String, StateValue)> {
        self.store.snapshot()
    }

    // ====================================================================
    // Requests: emit
    // ====================================================================

    /// Emit a request and wait for the matching handler(s) to complete.
    ///
    /// If no handler matches, this is a silent no-op.
    pub async fn emit<T: Any + Send + Sync>(&self, path: &str, payload: T) {
        self.emit_arc(path, Arc::new(payload)).await;
    }

    /// Emit a request with a pre-built Arc payload.
    pub async fn emit_arc(&self, path: &str, payload: Payload) {
        tracing::trace!(path, "emit");
        self.router
            .dispatch(path, payload, Arc::clone(&self.store))
            .await;
    }

    // ====================================================================
    // Requests: register handlers
    // ====================================================================

    /// Register an async request handler for a path pattern.
    ///
    /// The handler receives the matched request path, the type-erased
    /// payload and the state store. Pattern supports `+` and `#`.
    pub fn on<F, Fut>(&self, pattern: &str, handler: F)
    where
        F: Fn(String, Payload, Arc<StateStore>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.router.on(pattern, handler);
    }

    /// Check if any handler would match the given path.
    pub fn has_handler(&self, path: &str) -> bool {
        self.router.matches(path)
    }

    // ====================================================================
    // Subscriptions: observe state changes
    // ====================================================================

    /// Subscribe to state changes matching a pattern.
    ///
    /// The handler is called synchronously on the thread that calls `set`.
    /// It stays registered while the returned handle lives.
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> Subscription
    where
        F: Fn(&str, &StateValue) + Send + Sync + 'static,
    {
        self.store.subscribe(pattern, handler)
    }

    /// The underlying StateStore, for direct access from hosts and tests.
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }
}

impl Default for Flux {
    fn default() -> Self {
        Self::new()
    }
}
