//! Status board collaborators.
//!
//! Each external service the app depends on is a trait here with two
//! kinds of implementation: an HTTP client for the hosted service and an
//! in-process stand-in used in demo mode and tests.
//!
//! - [`Identity`]: accounts and the auth-state stream
//! - [`FeedStore`]: append a post, watch the ordered feed
//! - [`LocationProvider`]: permission, coordinates, address
//! - [`WeatherProvider`]: current conditions with fallback
//! - [`Notifier`]: local confirmations, push relay

pub mod enriched;
pub mod feed;
mod http;
pub mod identity;
pub mod location;
pub mod model;
pub mod notify;
pub mod token;
pub mod weather;

pub use enriched::{Enriched, LocationFailure, LocationLookup};
pub use feed::{FeedEvent, FeedStore, FirestoreFeedStore, MemoryFeedStore};
pub use identity::{AuthEvent, FirebaseIdentity, Identity, MemoryIdentity};
pub use location::{locate, FixedLocation, GeocodedLocation, LocationProvider};
pub use model::{
    sort_newest_first, Coordinates, FeedQuery, NewPost, PostLocation, StatusPost, UserIdentity,
    WeatherReading,
};
pub use notify::{ExpoPushRelay, LocalNotification, LogNotifier, Notifier, PushMessage};
pub use token::{StaticToken, TokenSource};
pub use weather::{fallback_reading, unconfigured_reading, OpenWeatherClient, WeatherProvider};
