//! Best-effort enrichment outcomes.
//!
//! Weather never fails a post: a failed or unconfigured lookup yields a
//! documented fallback reading tagged with the reason. Location either
//! resolves or reports the step that stopped it.

use std::fmt;

use serde::Serialize;

use crate::model::PostLocation;

/// A value that is either live or a stand-in for a failed lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Enriched<T> {
    Live(T),
    Fallback { value: T, reason: String },
}

impl<T> Enriched<T> {
    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Enriched::Fallback {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Enriched::Live(v) => v,
            Enriched::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Enriched::Live(v) => v,
            Enriched::Fallback { value, .. } => value,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Enriched::Live(_))
    }

    /// Why the fallback was used, if it was.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Enriched::Live(_) => None,
            Enriched::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// The step of a location lookup that stopped it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationFailure {
    PermissionDenied,
    CoordinatesUnavailable,
    GeocodeFailed,
}

impl fmt::Display for LocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            LocationFailure::PermissionDenied => "Location permission not granted",
            LocationFailure::CoordinatesUnavailable => "Current location unavailable",
            LocationFailure::GeocodeFailed => "Could not resolve an address",
        };
        f.write_str(msg)
    }
}

/// Outcome of permission → coordinates → reverse geocode.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationLookup {
    Found(PostLocation),
    Failed { step: LocationFailure, detail: String },
}

impl LocationLookup {
    pub fn failed(step: LocationFailure, detail: impl Into<String>) -> Self {
        LocationLookup::Failed {
            step,
            detail: detail.into(),
        }
    }

    pub fn found(&self) -> Option<&PostLocation> {
        match self {
            LocationLookup::Found(loc) => Some(loc),
            LocationLookup::Failed { .. } => None,
        }
    }

    pub fn into_found(self) -> Option<PostLocation> {
        match self {
            LocationLookup::Found(loc) => Some(loc),
            LocationLookup::Failed { .. } => None,
        }
    }
}
