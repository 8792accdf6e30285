//! Building a board from configuration.

use std::sync::Arc;
use std::time::Duration;

use statusboard_collab::{
    FeedStore, FirebaseIdentity, FirestoreFeedStore, FixedLocation, GeocodedLocation, Identity,
    LocationProvider, LogNotifier, MemoryFeedStore, MemoryIdentity, OpenWeatherClient, TokenSource,
};
use statusboard_core::AppConfig;

use super::{BoardSettings, Collaborators, StatusBoard};

/// Lower bound on the feed polling interval.
const MIN_POLL_INTERVAL_MS: u64 = 250;

impl Collaborators {
    /// Hosted services where configured, in-process stand-ins otherwise.
    pub fn from_config(config: &AppConfig) -> Self {
        let (identity, feed): (Arc<dyn Identity>, Arc<dyn FeedStore>) =
            if config.firebase.is_configured() {
                let identity = Arc::new(FirebaseIdentity::new(
                    &config.firebase,
                    Some(config.session.resolve_cache_path()),
                ));
                let tokens: Arc<dyn TokenSource> = identity.clone();
                let poll = Duration::from_millis(config.feed.poll_interval_ms.max(MIN_POLL_INTERVAL_MS));
                let feed = Arc::new(FirestoreFeedStore::new(&config.firebase, tokens, poll));
                (identity as Arc<dyn Identity>, feed as Arc<dyn FeedStore>)
            } else {
                tracing::info!("firebase not configured, using in-memory demo backend");
                (
                    Arc::new(MemoryIdentity::new()) as Arc<dyn Identity>,
                    Arc::new(MemoryFeedStore::new()) as Arc<dyn FeedStore>,
                )
            };

        let location: Arc<dyn LocationProvider> =
            if config.location.reverse_geocode && config.weather.is_configured() {
                Arc::new(GeocodedLocation::new(&config.location, &config.weather))
            } else {
                Arc::new(FixedLocation::from_config(&config.location))
            };

        Self {
            identity,
            feed,
            location,
            weather: Arc::new(OpenWeatherClient::new(&config.weather)),
            notifier: Arc::new(LogNotifier::from_config(&config.notifications)),
        }
    }
}

impl StatusBoard {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Collaborators::from_config(config),
            BoardSettings::from_config(&config.feed),
        )
    }
}
