//! Route state: stored at `app/route`.

use flux_derive::state;
use serde::{Deserialize, Serialize};

/// Which screen the shell shows: `/loading`, `/auth` or `/feed`.
#[state("app/route")]
#[derive(Serialize, Deserialize)]
pub struct AppRoute(pub String);

impl AppRoute {
    pub const LOADING: &'static str = "/loading";
    pub const AUTH: &'static str = "/auth";
    pub const FEED: &'static str = "/feed";

    pub fn loading() -> Self {
        Self(Self::LOADING.into())
    }

    pub fn auth() -> Self {
        Self(Self::AUTH.into())
    }

    pub fn feed() -> Self {
        Self(Self::FEED.into())
    }
}
