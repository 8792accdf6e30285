use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use flux::Flux;
use statusboard_collab::{
    fallback_reading, Coordinates, Enriched, FeedEvent, FeedQuery, FeedStore, FixedLocation,
    LocationProvider, LogNotifier, MemoryFeedStore, MemoryIdentity, NewPost, StatusPost,
    WeatherProvider, WeatherReading,
};
use statusboard_core::config::LocationConfig;
use statusboard_core::{Sink, StatusError, Subscription};

use super::helpers::*;
use super::*;
use crate::state::*;

const EMAIL: &str = "ada@example.com";
const PASSWORD: &str = "secret1";

struct FakeWeather {
    live: bool,
    calls: AtomicUsize,
}

impl FakeWeather {
    fn reading() -> WeatherReading {
        WeatherReading {
            temperature: "18°C".into(),
            description: "clear sky".into(),
            icon: "☀️".into(),
            humidity: Some("40%".into()),
            wind_speed: Some("1.5 m/s".into()),
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current_conditions(&self, _coordinates: Coordinates) -> Enriched<WeatherReading> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.live {
            Enriched::Live(Self::reading())
        } else {
            Enriched::fallback(fallback_reading(), "HTTP 401: invalid key")
        }
    }
}

struct Harness {
    flux: Flux,
    board: Arc<StatusBoard>,
    identity: Arc<MemoryIdentity>,
    feed: Arc<MemoryFeedStore>,
    weather: Arc<FakeWeather>,
    notifier: Arc<LogNotifier>,
}

fn atlanta() -> FixedLocation {
    FixedLocation::from_config(&LocationConfig::default())
}

fn harness_with(location: FixedLocation, weather_live: bool, notifier: LogNotifier) -> Harness {
    let identity = Arc::new(MemoryIdentity::new().with_account(EMAIL, PASSWORD));
    let feed = Arc::new(MemoryFeedStore::new());
    let weather = Arc::new(FakeWeather {
        live: weather_live,
        calls: AtomicUsize::new(0),
    });
    let notifier = Arc::new(notifier);
    let location: Arc<dyn LocationProvider> = Arc::new(location);
    let board = Arc::new(StatusBoard::new(
        Collaborators {
            identity: identity.clone(),
            feed: feed.clone(),
            location,
            weather: weather.clone(),
            notifier: notifier.clone(),
        },
        BoardSettings::default(),
    ));
    let flux = Flux::new();
    register_handlers(&flux, board.clone());
    Harness {
        flux,
        board,
        identity,
        feed,
        weather,
        notifier,
    }
}

async fn started(h: Harness) -> Harness {
    h.flux.emit(InitializeReq::PATH, InitializeReq {}).await;
    h
}

async fn signed_in_with(location: FixedLocation, weather_live: bool, notifier: LogNotifier) -> Harness {
    let h = started(harness_with(location, weather_live, notifier)).await;
    h.flux
        .emit(
            SignInReq::PATH,
            SignInReq {
                email: EMAIL.into(),
                password: PASSWORD.into(),
            },
        )
        .await;
    h
}

async fn signed_in() -> Harness {
    signed_in_with(atlanta(), true, LogNotifier::new()).await
}

impl Harness {
    fn route(&self) -> String {
        self.flux.get_as::<AppRoute>(AppRoute::PATH).unwrap().0
    }

    fn auth(&self) -> AuthState {
        self.flux.get_as::<AuthState>(AuthState::PATH).unwrap()
    }

    fn compose(&self) -> ComposeState {
        self.flux.get_as::<ComposeState>(ComposeState::PATH).unwrap()
    }

    fn feed_state(&self) -> Option<FeedState> {
        self.flux.get_as::<FeedState>(FeedState::PATH)
    }

    async fn compose_text(&self, text: &str) {
        self.flux
            .emit(ComposeUpdateReq::PATH, ComposeUpdateReq { content: text.into() })
            .await;
    }

    async fn post(&self, text: &str) {
        self.compose_text(text).await;
        self.flux.emit(PostStatusReq::PATH, PostStatusReq {}).await;
    }

    fn stored(&self) -> Vec<StatusPost> {
        self.feed.documents("statuses")
    }
}

fn post_at(id: &str, minutes_ago: i64) -> StatusPost {
    StatusPost {
        id: id.into(),
        content: format!("post {}", id),
        author_id: "u1".into(),
        author_email: "other@example.com".into(),
        created_at: Some(Utc::now() - Duration::minutes(minutes_ago)),
        location: None,
        coordinates: None,
        weather: None,
    }
}

// ========================================================================
// Session routing
// ========================================================================

#[tokio::test]
async fn initialize_without_session_routes_to_auth() {
    let h = started(harness_with(atlanta(), true, LogNotifier::new())).await;
    assert_eq!(h.route(), AppRoute::AUTH);
    assert_eq!(h.auth().phase, AuthPhase::Anonymous);
    assert_eq!(h.compose(), ComposeState::empty());
    assert!(h.board.session_is_open());
}

#[tokio::test]
async fn sign_in_routes_to_feed() {
    let h = signed_in().await;
    let auth = h.auth();
    assert!(auth.is_authenticated());
    assert_eq!(auth.user.unwrap().email, EMAIL);
    assert!(!auth.busy);
    assert_eq!(h.route(), AppRoute::FEED);
}

#[tokio::test]
async fn empty_credentials_never_reach_identity() {
    let h = started(harness_with(atlanta(), true, LogNotifier::new())).await;
    h.flux
        .emit(
            SignInReq::PATH,
            SignInReq {
                email: "  ".into(),
                password: PASSWORD.into(),
            },
        )
        .await;
    h.flux
        .emit(
            SignUpReq::PATH,
            SignUpReq {
                email: EMAIL.into(),
                password: String::new(),
            },
        )
        .await;

    assert_eq!(h.identity.call_count(), 0);
    assert_eq!(h.auth().error.as_deref(), Some(MSG_FILL_ALL_FIELDS));
    assert_eq!(h.route(), AppRoute::AUTH);
}

#[tokio::test]
async fn wrong_password_shows_error_and_stays_anonymous() {
    let h = started(harness_with(atlanta(), true, LogNotifier::new())).await;
    h.flux
        .emit(
            SignInReq::PATH,
            SignInReq {
                email: EMAIL.into(),
                password: "nope-nope".into(),
            },
        )
        .await;

    let auth = h.auth();
    assert_eq!(auth.phase, AuthPhase::Anonymous);
    assert!(auth.error.is_some());
    assert!(!auth.busy);
    assert_eq!(h.route(), AppRoute::AUTH);
}

#[tokio::test]
async fn submit_follows_toggled_mode() {
    let h = started(harness_with(atlanta(), true, LogNotifier::new())).await;
    h.flux.emit(ToggleAuthModeReq::PATH, ToggleAuthModeReq {}).await;
    assert_eq!(h.auth().mode, AuthMode::SignUp);

    h.flux
        .emit(
            SubmitAuthReq::PATH,
            SubmitAuthReq {
                email: "grace@example.com".into(),
                password: "hopper1".into(),
            },
        )
        .await;

    let auth = h.auth();
    assert!(auth.is_authenticated());
    assert_eq!(auth.notice.as_deref(), Some(MSG_ACCOUNT_CREATED));
    assert_eq!(h.route(), AppRoute::FEED);
}

#[tokio::test]
async fn sign_out_returns_to_auth_and_clears_feed() {
    let h = signed_in().await;
    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;
    h.compose_text("draft").await;

    h.flux.emit(SignOutReq::PATH, SignOutReq {}).await;

    assert_eq!(h.route(), AppRoute::AUTH);
    assert_eq!(h.auth().phase, AuthPhase::Anonymous);
    assert!(h.feed_state().is_none());
    assert_eq!(h.compose(), ComposeState::empty());
    assert_eq!(h.feed.subscriber_count(), 0);
    assert!(!h.board.feed_is_open());
}

#[tokio::test]
async fn expired_session_routes_to_auth() {
    let h = signed_in().await;
    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;
    assert_eq!(h.feed.subscriber_count(), 1);

    h.identity.expire_session();

    assert_eq!(h.route(), AppRoute::AUTH);
    assert_eq!(h.feed.subscriber_count(), 0);
}

#[tokio::test]
async fn shutdown_releases_subscriptions() {
    let h = signed_in().await;
    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;

    h.flux.emit(ShutdownReq::PATH, ShutdownReq {}).await;

    assert!(!h.board.session_is_open());
    assert!(!h.board.feed_is_open());
    assert_eq!(h.feed.subscriber_count(), 0);
    assert!(h.flux.get(AuthState::PATH).is_none());
    assert_eq!(h.route(), AppRoute::LOADING);

    // No listener left: a later expiry changes nothing.
    h.identity.expire_session();
    assert_eq!(h.route(), AppRoute::LOADING);
}

// ========================================================================
// Feed
// ========================================================================

#[tokio::test]
async fn feed_mirrors_store_newest_first() {
    let h = signed_in().await;
    h.feed.insert("statuses", post_at("old", 90));
    h.feed.insert("statuses", post_at("new", 3));

    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;
    let state = h.feed_state().unwrap();
    assert!(state.subscribed);
    assert!(!state.loading);
    let ids: Vec<_> = state.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
    assert_eq!(state.items[0].time_label, "3 minutes ago");
    assert_eq!(state.items[1].time_label, "1 hour ago");

    h.feed.insert("statuses", post_at("newest", 0));
    let state = h.feed_state().unwrap();
    assert_eq!(state.items.len(), 3);
    assert_eq!(state.items[0].id, "newest");
    assert_eq!(state.items[0].time_label, "Just now");
}

#[tokio::test]
async fn opening_twice_keeps_one_subscription() {
    let h = signed_in().await;
    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;
    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;
    assert_eq!(h.feed.subscriber_count(), 1);

    h.flux.emit(CloseFeedReq::PATH, CloseFeedReq {}).await;
    assert_eq!(h.feed.subscriber_count(), 0);
    assert!(!h.feed_state().unwrap().subscribed);

    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;
    assert_eq!(h.feed.subscriber_count(), 1);
}

#[tokio::test]
async fn feed_open_needs_a_session() {
    let h = started(harness_with(atlanta(), true, LogNotifier::new())).await;
    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;
    assert_eq!(h.feed.subscriber_count(), 0);
    assert!(h.feed_state().is_none());
}

#[tokio::test]
async fn feed_error_keeps_items() {
    let h = signed_in().await;
    h.feed.insert("statuses", post_at("a", 5));
    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;

    h.feed
        .push_error("statuses", StatusError::Unavailable("backend unavailable".into()));
    let state = h.feed_state().unwrap();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.error.as_deref(), Some("backend unavailable"));

    h.feed.insert("statuses", post_at("b", 1));
    let state = h.feed_state().unwrap();
    assert_eq!(state.items.len(), 2);
    assert!(state.error.is_none());
}

// ========================================================================
// Posting
// ========================================================================

#[tokio::test]
async fn blank_status_is_rejected_locally() {
    let h = signed_in().await;
    h.post("   \n ").await;

    assert_eq!(h.feed.append_count(), 0);
    assert_eq!(h.compose().error.as_deref(), Some(MSG_EMPTY_STATUS));
    assert!(h.notifier.fired().is_empty());
}

#[tokio::test]
async fn overlong_status_is_rejected_locally() {
    let h = signed_in().await;
    h.post(&"x".repeat(281)).await;

    assert_eq!(h.feed.append_count(), 0);
    let compose = h.compose();
    assert!(compose.error.unwrap().contains("280"));
    assert_eq!(compose.content.len(), 281);
}

#[tokio::test]
async fn signed_out_post_never_reaches_feed() {
    let h = started(harness_with(atlanta(), true, LogNotifier::new())).await;
    h.post("hello").await;
    assert_eq!(h.feed.append_count(), 0);
    assert_eq!(h.compose().error.as_deref(), Some(MSG_SIGN_IN_TO_POST));
}

#[tokio::test]
async fn plain_post_is_stored_and_confirmed() {
    let h = signed_in().await;
    h.post("  Hello world  ").await;

    let stored = h.stored();
    assert_eq!(stored.len(), 1);
    let post = &stored[0];
    assert_eq!(post.content, "Hello world");
    assert_eq!(post.author_email, EMAIL);
    assert!(post.created_at.is_some());
    assert!(post.location.is_none());
    assert!(post.weather.is_none());
    assert_eq!(h.weather.calls.load(Ordering::SeqCst), 0);

    let compose = h.compose();
    assert_eq!(compose.content, "");
    assert!(!compose.busy);
    assert!(compose.pending_id.is_none());
    assert_eq!(compose.notice.as_deref(), Some(MSG_POSTED));

    let fired = h.notifier.fired();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].title, NOTIFY_POSTED_TITLE);
    assert_eq!(fired[0].body, NOTIFY_POSTED_BODY);
    assert_eq!(fired[0].data["postId"], post.id.as_str());
}

#[tokio::test]
async fn enriched_post_carries_location_and_weather() {
    let h = signed_in().await;
    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;
    h.flux.emit(ToggleLocationReq::PATH, ToggleLocationReq {}).await;
    h.flux.emit(ToggleWeatherReq::PATH, ToggleWeatherReq {}).await;
    h.post("Sunny out").await;

    let post = &h.stored()[0];
    assert_eq!(post.weather.as_ref().unwrap(), &FakeWeather::reading());
    assert!(!h.compose().include_location);

    // Stored document: the address string under `location`, coordinates beside it.
    let doc = serde_json::to_value(post).unwrap();
    assert_eq!(doc["location"], "Atlanta, GA, USA (Mock Location)");
    assert_eq!(doc["coordinates"]["latitude"], 33.749);
    assert_eq!(doc["coordinates"]["longitude"], -84.388);
    assert_eq!(post.coordinates, Some(Coordinates::new(33.749, -84.388)));

    let item = &h.feed_state().unwrap().items[0];
    assert_eq!(item.location.as_deref(), Some("Atlanta, GA, USA (Mock Location)"));
}

#[tokio::test]
async fn weather_failure_attaches_fallback() {
    let h = signed_in_with(atlanta(), false, LogNotifier::new()).await;
    h.flux.emit(ToggleWeatherReq::PATH, ToggleWeatherReq {}).await;
    h.post("Cloudy?").await;

    let post = &h.stored()[0];
    assert!(post.location.is_none());
    let weather = post.weather.as_ref().unwrap();
    assert_eq!(weather.description, "Partly cloudy (Mock Data)");
    assert_eq!(weather.temperature, "22°C");
}

#[tokio::test]
async fn denied_location_still_posts() {
    let h = signed_in_with(FixedLocation::denied(), true, LogNotifier::new()).await;
    h.flux.emit(ToggleLocationReq::PATH, ToggleLocationReq {}).await;
    h.flux.emit(ToggleWeatherReq::PATH, ToggleWeatherReq {}).await;
    h.post("Somewhere").await;

    let stored = h.stored();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].location.is_none());
    assert!(stored[0].weather.is_none());
    assert_eq!(h.weather.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.notifier.fired().len(), 1);
}

#[tokio::test]
async fn weather_alone_uses_device_coordinates() {
    let h = signed_in().await;
    h.flux.emit(ToggleWeatherReq::PATH, ToggleWeatherReq {}).await;
    h.post("Just weather").await;

    let post = &h.stored()[0];
    assert!(post.location.is_none());
    assert!(post.weather.is_some());
    assert_eq!(h.weather.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_append_keeps_the_draft() {
    let h = signed_in().await;
    h.feed.fail_appends(Some("offline"));
    h.post("Try me").await;

    assert!(h.stored().is_empty());
    let compose = h.compose();
    assert_eq!(compose.content, "Try me");
    assert!(!compose.busy);
    assert!(compose.pending_id.is_some());
    assert_eq!(compose.error.as_deref(), Some("network: offline"));
    assert!(h.notifier.fired().is_empty());
}

/// Feed store whose appends wait until the test opens the gate.
struct GatedFeed {
    inner: MemoryFeedStore,
    gate: tokio::sync::Notify,
}

#[async_trait]
impl FeedStore for GatedFeed {
    async fn append(&self, collection: &str, post: NewPost) -> Result<String, StatusError> {
        self.gate.notified().await;
        self.inner.append(collection, post).await
    }

    fn subscribe(&self, query: FeedQuery, sink: Sink<FeedEvent>) -> Subscription {
        self.inner.subscribe(query, sink)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_submits_post_once() {
    let feed = Arc::new(GatedFeed {
        inner: MemoryFeedStore::new(),
        gate: tokio::sync::Notify::new(),
    });
    let board = Arc::new(StatusBoard::new(
        Collaborators {
            identity: Arc::new(MemoryIdentity::new().with_account(EMAIL, PASSWORD)),
            feed: feed.clone(),
            location: Arc::new(atlanta()),
            weather: Arc::new(FakeWeather {
                live: true,
                calls: AtomicUsize::new(0),
            }),
            notifier: Arc::new(LogNotifier::new()),
        },
        BoardSettings::default(),
    ));
    let flux = Arc::new(Flux::new());
    register_handlers(&flux, board);
    flux.emit(InitializeReq::PATH, InitializeReq {}).await;
    flux.emit(
        SignInReq::PATH,
        SignInReq {
            email: EMAIL.into(),
            password: PASSWORD.into(),
        },
    )
    .await;
    flux.emit(
        ComposeUpdateReq::PATH,
        ComposeUpdateReq {
            content: "Double tap".into(),
        },
    )
    .await;

    let submits: Vec<_> = (0..8)
        .map(|_| {
            let flux = flux.clone();
            tokio::spawn(async move { flux.emit(PostStatusReq::PATH, PostStatusReq {}).await })
        })
        .collect();
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(flux.get_as::<ComposeState>(ComposeState::PATH).unwrap().busy);

    feed.gate.notify_one();
    for submit in submits {
        submit.await.unwrap();
    }

    assert_eq!(feed.inner.append_count(), 1);
    assert_eq!(feed.inner.documents("statuses").len(), 1);
    let compose = flux.get_as::<ComposeState>(ComposeState::PATH).unwrap();
    assert!(!compose.busy);
    assert_eq!(compose.notice.as_deref(), Some(MSG_POSTED));
}

#[tokio::test]
async fn retry_after_lost_ack_posts_once() {
    let h = signed_in().await;
    h.feed.lose_next_ack();
    h.post("Only once").await;

    assert_eq!(h.stored().len(), 1);
    let pending = h.compose().pending_id.unwrap();
    assert_eq!(h.stored()[0].id, pending);

    h.flux.emit(PostStatusReq::PATH, PostStatusReq {}).await;

    assert_eq!(h.feed.append_count(), 2);
    assert_eq!(h.stored().len(), 1);
    assert_eq!(h.compose().content, "");
    assert_eq!(h.notifier.fired().len(), 1);
}

#[tokio::test]
async fn edited_draft_gets_a_new_id() {
    let h = signed_in().await;
    h.feed.fail_appends(Some("offline"));
    h.post("first").await;
    let first = h.compose().pending_id.unwrap();

    h.feed.fail_appends(None);
    h.post("first, edited").await;

    let stored = h.stored();
    assert_eq!(stored.len(), 1);
    assert_ne!(stored[0].id, first);
}

#[tokio::test]
async fn notification_failure_does_not_fail_post() {
    let h = signed_in_with(atlanta(), true, LogNotifier::failing()).await;
    h.post("Quiet post").await;

    assert_eq!(h.stored().len(), 1);
    let compose = h.compose();
    assert!(compose.error.is_none());
    assert_eq!(compose.content, "");
}

#[tokio::test]
async fn posted_status_appears_in_open_feed() {
    let h = signed_in().await;
    h.feed.insert("statuses", post_at("earlier", 10));
    h.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;

    h.post("Fresh").await;

    let items = h.feed_state().unwrap().items;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].content, "Fresh");
    assert_eq!(items[0].time_label, "Just now");
}

// ========================================================================
// Enrichment preview
// ========================================================================

#[tokio::test]
async fn refresh_enrichment_shows_location_and_weather() {
    let h = signed_in_with(atlanta(), false, LogNotifier::new()).await;
    h.flux.emit(RefreshEnrichmentReq::PATH, RefreshEnrichmentReq {}).await;

    let state = h.flux.get_as::<EnrichmentState>(EnrichmentState::PATH).unwrap();
    assert!(!state.busy);
    assert!(state.location.is_some());
    assert!(!state.weather_live);
    assert_eq!(state.weather.unwrap(), fallback_reading());
    assert!(state.error.is_none());
}

#[tokio::test]
async fn refresh_enrichment_reports_denied_permission() {
    let h = signed_in_with(FixedLocation::denied(), true, LogNotifier::new()).await;
    h.flux.emit(RefreshEnrichmentReq::PATH, RefreshEnrichmentReq {}).await;

    let state = h.flux.get_as::<EnrichmentState>(EnrichmentState::PATH).unwrap();
    assert!(state.location.is_none());
    assert!(state.weather.is_none());
    assert_eq!(state.error.as_deref(), Some("Location permission not granted"));
}

// ========================================================================
// JSON requests
// ========================================================================

#[tokio::test]
async fn decoded_requests_drive_handlers() {
    let h = started(harness_with(atlanta(), true, LogNotifier::new())).await;
    let body = serde_json::json!({ "email": EMAIL, "password": PASSWORD }).to_string();
    let payload = crate::request::decode(SignInReq::PATH, &body).unwrap();
    h.flux.emit_arc(SignInReq::PATH, payload).await;
    assert_eq!(h.route(), AppRoute::FEED);

    let body = serde_json::json!({ "content": "from json" }).to_string();
    let payload = crate::request::decode(ComposeUpdateReq::PATH, &body).unwrap();
    h.flux.emit_arc(ComposeUpdateReq::PATH, payload).await;
    let payload = crate::request::decode(PostStatusReq::PATH, "").unwrap();
    h.flux.emit_arc(PostStatusReq::PATH, payload).await;

    assert_eq!(h.stored()[0].content, "from json");
}

#[test]
fn state_serializes_camel_case() {
    let json = flux::StateValue::new(ComposeState::empty()).to_json().unwrap();
    assert_eq!(json["includeLocation"], false);
    assert!(json.get("pendingId").is_none());
}
