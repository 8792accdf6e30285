//! Compose box, status submission and the enrichment preview.

use flux::StateStore;
use statusboard_collab::{
    locate, Coordinates, LocalNotification, LocationLookup, NewPost, PostLocation, WeatherReading,
};
use statusboard_core::{new_id, StatusError};

use super::helpers::{self, MSG_POSTED, MSG_SIGN_IN_TO_POST, NOTIFY_POSTED_BODY, NOTIFY_POSTED_TITLE};
use super::StatusBoard;
use crate::request::*;
use crate::state::*;

pub fn handle_update(req: &ComposeUpdateReq, store: &StateStore) {
    store.update(ComposeState::PATH, ComposeState::empty, |s| {
        if s.content != req.content {
            s.content = req.content.clone();
            // New text is a new submission.
            s.pending_id = None;
            s.error = None;
            s.notice = None;
        }
    });
}

pub fn handle_toggle_location(store: &StateStore) {
    store.update(ComposeState::PATH, ComposeState::empty, |s| {
        s.include_location = !s.include_location;
    });
}

pub fn handle_toggle_weather(store: &StateStore) {
    store.update(ComposeState::PATH, ComposeState::empty, |s| {
        s.include_weather = !s.include_weather;
    });
}

/// Post the compose box.
///
/// Local checks run before any collaborator call. Location and weather
/// are best effort: a failed lookup drops that part, never the post. A
/// failed append keeps the text and its pending id so a retry cannot
/// duplicate the post.
pub async fn handle_post(store: &StateStore, ctx: &StatusBoard) {
    let compose = store
        .get_as::<ComposeState>(ComposeState::PATH)
        .unwrap_or_else(ComposeState::empty);
    if compose.busy {
        tracing::debug!("post already in flight");
        return;
    }

    let Some(user) = helpers::current_user(store) else {
        set_error(store, &StatusError::Unauthenticated(MSG_SIGN_IN_TO_POST.into()));
        return;
    };
    let content = match helpers::validate_content(&compose.content, ctx.settings().max_content_chars) {
        Ok(content) => content,
        Err(e) => {
            set_error(store, &e);
            return;
        }
    };

    // Busy flag and post id are claimed under one store lock.
    let mut id = String::new();
    let claimed = store.update_if(ComposeState::PATH, ComposeState::empty, |s| {
        if s.busy {
            return false;
        }
        id = s.pending_id.clone().unwrap_or_else(new_id);
        s.busy = true;
        s.error = None;
        s.notice = None;
        s.pending_id = Some(id.clone());
        true
    });
    if !claimed {
        tracing::debug!("post already in flight");
        return;
    }

    let location = if compose.include_location {
        match locate(ctx.location()).await {
            LocationLookup::Found(location) => Some(location),
            LocationLookup::Failed { step, detail } => {
                tracing::warn!(%step, %detail, "posting without location");
                None
            }
        }
    } else {
        None
    };
    let weather = if compose.include_weather {
        weather_for(ctx, location.as_ref(), compose.include_location).await
    } else {
        None
    };

    let post = NewPost {
        id,
        content,
        author_id: user.uid,
        author_email: user.email,
        location: None,
        coordinates: None,
        weather,
    }
    .located_at(location);
    match ctx.feed().append(&ctx.settings().collection, post).await {
        Ok(id) => {
            tracing::info!(%id, "status posted");
            store.set(
                ComposeState::PATH,
                ComposeState {
                    notice: Some(MSG_POSTED.into()),
                    ..ComposeState::empty()
                },
            );
            confirm_posted(ctx, &id).await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "append failed");
            store.update(ComposeState::PATH, ComposeState::empty, |s| {
                s.busy = false;
                s.error = Some(e.to_string());
            });
        }
    }
}

/// Resolve location and weather for the preview card.
pub async fn handle_refresh_enrichment(store: &StateStore, ctx: &StatusBoard) {
    store.update(EnrichmentState::PATH, EnrichmentState::default, |s| {
        s.busy = true;
        s.error = None;
    });

    let next = match locate(ctx.location()).await {
        LocationLookup::Found(location) => {
            let reading = ctx.weather().current_conditions(location.coordinates).await;
            if let Some(reason) = reading.reason() {
                tracing::debug!(%reason, "preview shows fallback weather");
            }
            EnrichmentState {
                busy: false,
                weather_live: reading.is_live(),
                weather: Some(reading.into_value()),
                location: Some(location),
                error: None,
            }
        }
        LocationLookup::Failed { step, detail } => {
            tracing::debug!(%step, %detail, "preview lookup failed");
            EnrichmentState {
                error: Some(step.to_string()),
                ..EnrichmentState::default()
            }
        }
    };
    store.set(EnrichmentState::PATH, next);
}

/// Weather for a post. Coordinates come from the resolved location; when
/// location was not requested they are fetched on their own. A location
/// that was requested but failed leaves no coordinates, so no weather.
async fn weather_for(
    ctx: &StatusBoard,
    location: Option<&PostLocation>,
    location_requested: bool,
) -> Option<WeatherReading> {
    let coordinates: Option<Coordinates> = match location {
        Some(location) => Some(location.coordinates),
        None if !location_requested => standalone_coordinates(ctx).await,
        None => None,
    };
    let Some(coordinates) = coordinates else {
        tracing::warn!("posting without weather: no coordinates");
        return None;
    };
    let reading = ctx.weather().current_conditions(coordinates).await;
    if let Some(reason) = reading.reason() {
        tracing::warn!(%reason, "attaching fallback weather");
    }
    Some(reading.into_value())
}

async fn standalone_coordinates(ctx: &StatusBoard) -> Option<Coordinates> {
    if !ctx.location().request_permission().await {
        return None;
    }
    match ctx.location().current_coordinates().await {
        Ok(coordinates) => Some(coordinates),
        Err(e) => {
            tracing::debug!(error = %e, "no coordinates for weather");
            None
        }
    }
}

async fn confirm_posted(ctx: &StatusBoard, id: &str) {
    let notification = LocalNotification {
        title: NOTIFY_POSTED_TITLE.into(),
        body: NOTIFY_POSTED_BODY.into(),
        data: serde_json::json!({ "postId": id }),
    };
    if let Err(e) = ctx.notifier().fire_local(notification).await {
        tracing::warn!(error = %e, "confirmation notification failed");
    }
}

fn set_error(store: &StateStore, error: &StatusError) {
    store.update(ComposeState::PATH, ComposeState::empty, |s| {
        s.error = Some(error.to_string());
        s.notice = None;
    });
}
