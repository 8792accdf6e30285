use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use crate::pattern::TopicPattern;
use crate::store::StateStore;

/// A boxed, `Send`-able future returned by request handlers.
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Type-erased request payload.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Type-erased handler function stored in the router.
///
/// Takes owned values so the returned future can be `'static`:
/// - `String`: the request path
/// - `Payload`: the request body (downcast inside)
/// - `Arc<StateStore>`: state store for reading/writing state
type ErasedHandler = Arc<dyn Fn(String, Payload, Arc<StateStore>) -> BoxFuture + Send + Sync>;

/// Request router: maps path patterns to async handlers.
///
/// Multiple handlers may match one path (wildcards); all of them run,
/// sequentially, in registration order.
pub struct Router {
    routes: RwLock<Vec<(TopicPattern, ErasedHandler)>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(Vec::new()),
        }
    }

    /// Register an async handler for a path pattern (`+`/`#` wildcards allowed).
    pub fn on<F, Fut>(&self, pattern: &str, handler: F)
    where
        F: Fn(String, Payload, Arc<StateStore>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: ErasedHandler = Arc::new(
            move |path: String, payload: Payload, store: Arc<StateStore>| -> BoxFuture {
                Box::pin(handler(path, payload, store))
            },
        );
        self.routes
            .write()
            .expect("router poisoned")
            .push((TopicPattern::parse(pattern), handler));
    }

    /// Dispatch a request to all matching handlers.
    ///
    /// Returns the number of handlers that ran; zero is not an error.
    pub async fn dispatch(&self, path: &str, payload: Payload, store: Arc<StateStore>) -> usize {
        let handlers = self.matching(path);
        let count = handlers.len();
        if count == 0 {
            tracing::debug!(path, "no handler for request");
        }
        for handler in handlers {
            handler(path.to_string(), Arc::clone(&payload), Arc::clone(&store)).await;
        }
        count
    }

    /// Check if a handler is registered under exactly this pattern.
    pub fn has_handler(&self, pattern: &str) -> bool {
        self.routes
            .read()
            .expect("router poisoned")
            .iter()
            .any(|(p, _)| p.as_str() == pattern)
    }

    /// Check if any handler would match the given path.
    pub fn matches(&self, path: &str) -> bool {
        !self.matching(path).is_empty()
    }

    fn matching(&self, path: &str) -> Vec<ErasedHandler> {
        self.routes
            .read()
            .expect("router poisoned")
            .iter()
            .filter(|(p, _)| p.matches(path))
            .map(|(_, h)| Arc::clone(h))
            .collect()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    fn test_store() -> Arc<StateStore> {
        Arc::new(StateStore::new())
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    #[tokio::test]
    async fn dispatch_exact_match() {
        let router = Router::new();
        let called = Arc::new(AtomicU64::new(0));
        let c = called.clone();

        router.on("status/post", move |_, _, _| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::Relaxed);
            }
        });

        let ran = router.dispatch("status/post", Arc::new(()), test_store()).await;
        assert_eq!(ran, 1);
        assert_eq!(called.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn dispatch_no_match_is_noop() {
        let router = Router::new();
        router.on("auth/sign-in", |_, _, _| async {});
        let ran = router.dispatch("auth/sign-out", Arc::new(()), test_store()).await;
        assert_eq!(ran, 0);
    }

    #[tokio::test]
    async fn handler_receives_typed_payload_and_writes_store() {
        #[derive(Debug)]
        struct PostReq {
            content: String,
        }

        let router = Router::new();
        router.on("status/post", |_, payload, store| async move {
            if let Some(req) = payload.downcast_ref::<PostReq>() {
                store.set("compose/last", req.content.clone());
            }
        });

        let store = test_store();
        router
            .dispatch(
                "status/post",
                Arc::new(PostReq { content: "Hello world".into() }),
                store.clone(),
            )
            .await;
        assert_eq!(store.get_as::<String>("compose/last").as_deref(), Some("Hello world"));
    }

    #[tokio::test]
    async fn wrong_payload_type_is_ignored() {
        let router = Router::new();
        router.on("status/post", |_, payload, store| async move {
            if let Some(n) = payload.downcast_ref::<u32>() {
                store.set("n", *n);
            }
        });

        let store = test_store();
        router.dispatch("status/post", Arc::new("text"), store.clone()).await;
        assert!(store.get("n").is_none());
    }

    #[tokio::test]
    async fn wildcard_handlers_run_in_registration_order() {
        let router = Router::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (pattern, tag) in [("auth/#", "multi"), ("auth/sign-in", "exact"), ("+/sign-in", "single")] {
            let o = order.clone();
            router.on(pattern, move |_, _, _| {
                let o = o.clone();
                async move {
                    o.lock().unwrap().push(tag);
                }
            });
        }

        let ran = router.dispatch("auth/sign-in", Arc::new(()), test_store()).await;
        assert_eq!(ran, 3);
        assert_eq!(*order.lock().unwrap(), vec!["multi", "exact", "single"]);
    }

    #[tokio::test]
    async fn handler_receives_request_path() {
        let router = Router::new();
        let seen = Arc::new(Mutex::new(String::new()));
        let s = seen.clone();
        router.on("feed/+", move |path, _, _| {
            let s = s.clone();
            async move {
                *s.lock().unwrap() = path;
            }
        });

        router.dispatch("feed/open", Arc::new(()), test_store()).await;
        assert_eq!(*seen.lock().unwrap(), "feed/open");
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    #[test]
    fn has_handler_is_exact_pattern() {
        let router = Router::new();
        router.on("auth/+", |_, _, _| async {});
        assert!(router.has_handler("auth/+"));
        assert!(!router.has_handler("auth/sign-in"));
        assert!(router.matches("auth/sign-in"));
        assert!(!router.matches("feed/open"));
    }
}
