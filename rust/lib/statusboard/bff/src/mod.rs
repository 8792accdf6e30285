//! BFF handler implementations and Flux wiring.
//!
//! `register_handlers` binds each `#[request]` path to its handler,
//! downcasting the payload and handing the handler the state store and
//! the [`StatusBoard`] context.

pub mod app_handlers;
pub mod auth_handlers;
pub mod compose_handlers;
pub mod feed_handlers;
pub mod helpers;
mod wiring;

use std::future::Future;
use std::sync::{Arc, Mutex};

use flux::{Flux, StateStore};
use statusboard_collab::{FeedStore, Identity, LocationProvider, Notifier, WeatherProvider};
use statusboard_core::config::FeedConfig;
use statusboard_core::Subscription;

use crate::request::*;

/// The external services a board talks to.
pub struct Collaborators {
    pub identity: Arc<dyn Identity>,
    pub feed: Arc<dyn FeedStore>,
    pub location: Arc<dyn LocationProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    pub notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSettings {
    /// Feed collection posts are appended to and read from.
    pub collection: String,
    /// Post length budget in characters; 0 disables the check.
    pub max_content_chars: usize,
}

impl BoardSettings {
    pub fn from_config(feed: &FeedConfig) -> Self {
        Self {
            collection: feed.collection.clone(),
            max_content_chars: feed.max_content_chars,
        }
    }
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}

/// Handler context: collaborators plus the live subscriptions the board
/// owns. At most one session listener and one feed subscription exist
/// at a time.
pub struct StatusBoard {
    collab: Collaborators,
    settings: BoardSettings,
    session: Mutex<Option<Subscription>>,
    feed_sub: Mutex<Option<Subscription>>,
}

impl StatusBoard {
    pub fn new(collab: Collaborators, settings: BoardSettings) -> Self {
        Self {
            collab,
            settings,
            session: Mutex::new(None),
            feed_sub: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    pub fn identity(&self) -> &dyn Identity {
        self.collab.identity.as_ref()
    }

    pub fn feed(&self) -> &dyn FeedStore {
        self.collab.feed.as_ref()
    }

    pub fn location(&self) -> &dyn LocationProvider {
        self.collab.location.as_ref()
    }

    pub fn weather(&self) -> &dyn WeatherProvider {
        self.collab.weather.as_ref()
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.collab.notifier.as_ref()
    }

    /// Whether a feed subscription is currently held.
    pub fn feed_is_open(&self) -> bool {
        self.feed_sub.lock().expect("feed slot poisoned").is_some()
    }

    pub fn session_is_open(&self) -> bool {
        self.session.lock().expect("session slot poisoned").is_some()
    }

    /// Open the feed subscription unless one is already held.
    ///
    /// The slot stays locked while `open` runs, so store subscribers that
    /// see the first snapshot must not emit feed requests synchronously.
    pub(crate) fn open_feed_with<F>(&self, open: F) -> bool
    where
        F: FnOnce() -> Subscription,
    {
        let mut slot = self.feed_sub.lock().expect("feed slot poisoned");
        if slot.is_some() {
            return false;
        }
        *slot = Some(open());
        true
    }

    /// Release the feed subscription, if any.
    pub(crate) fn close_feed(&self) -> bool {
        let taken = self.feed_sub.lock().expect("feed slot poisoned").take();
        match taken {
            Some(sub) => {
                sub.unsubscribe();
                true
            }
            None => false,
        }
    }

    pub(crate) fn replace_session(&self, sub: Option<Subscription>) {
        let old = {
            let mut slot = self.session.lock().expect("session slot poisoned");
            std::mem::replace(&mut *slot, sub)
        };
        drop(old);
    }
}

/// Register `handler` for `path`, downcasting the payload to `R`.
fn route<R, F, Fut>(flux: &Flux, path: &str, ctx: &Arc<StatusBoard>, handler: F)
where
    R: Clone + Send + Sync + 'static,
    F: Fn(R, Arc<StateStore>, Arc<StatusBoard>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let ctx = Arc::clone(ctx);
    let handler = Arc::new(handler);
    flux.on(path, move |path, payload, store| {
        let ctx = Arc::clone(&ctx);
        let handler = Arc::clone(&handler);
        let req = payload.downcast_ref::<R>().cloned();
        async move {
            match req {
                Some(req) => handler(req, store, ctx).await,
                None => tracing::warn!(%path, "payload type mismatch, request ignored"),
            }
        }
    });
}

/// Register all handlers with a Flux instance.
pub fn register_handlers(flux: &Flux, ctx: Arc<StatusBoard>) {
    // app
    route(flux, InitializeReq::PATH, &ctx, |_: InitializeReq, store, ctx| async move {
        app_handlers::handle_initialize(&store, &ctx).await;
    });
    route(flux, ShutdownReq::PATH, &ctx, |_: ShutdownReq, store, ctx| async move {
        app_handlers::handle_shutdown(&store, &ctx).await;
    });

    // auth
    route(flux, SignInReq::PATH, &ctx, |req: SignInReq, store, ctx| async move {
        auth_handlers::handle_sign_in(&req, &store, &ctx).await;
    });
    route(flux, SignUpReq::PATH, &ctx, |req: SignUpReq, store, ctx| async move {
        auth_handlers::handle_sign_up(&req, &store, &ctx).await;
    });
    route(flux, SubmitAuthReq::PATH, &ctx, |req: SubmitAuthReq, store, ctx| async move {
        auth_handlers::handle_submit(&req, &store, &ctx).await;
    });
    route(flux, SignOutReq::PATH, &ctx, |_: SignOutReq, store, ctx| async move {
        auth_handlers::handle_sign_out(&store, &ctx).await;
    });
    route(flux, ToggleAuthModeReq::PATH, &ctx, |_: ToggleAuthModeReq, store, _| async move {
        auth_handlers::handle_toggle_mode(&store);
    });

    // feed
    route(flux, OpenFeedReq::PATH, &ctx, |_: OpenFeedReq, store, ctx| async move {
        feed_handlers::handle_open(&store, &ctx);
    });
    route(flux, CloseFeedReq::PATH, &ctx, |_: CloseFeedReq, store, ctx| async move {
        feed_handlers::handle_close(&store, &ctx);
    });

    // compose
    route(flux, ComposeUpdateReq::PATH, &ctx, |req: ComposeUpdateReq, store, _| async move {
        compose_handlers::handle_update(&req, &store);
    });
    route(flux, ToggleLocationReq::PATH, &ctx, |_: ToggleLocationReq, store, _| async move {
        compose_handlers::handle_toggle_location(&store);
    });
    route(flux, ToggleWeatherReq::PATH, &ctx, |_: ToggleWeatherReq, store, _| async move {
        compose_handlers::handle_toggle_weather(&store);
    });
    route(flux, PostStatusReq::PATH, &ctx, |_: PostStatusReq, store, ctx| async move {
        compose_handlers::handle_post(&store, &ctx).await;
    });
    route(flux, RefreshEnrichmentReq::PATH, &ctx, |_: RefreshEnrichmentReq, store, ctx| async move {
        compose_handlers::handle_refresh_enrichment(&store, &ctx).await;
    });
}

#[cfg(test)]
mod tests;
