//! Reading and posting.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use statusboard::request::{
    CloseFeedReq, ComposeUpdateReq, OpenFeedReq, PostStatusReq, ToggleLocationReq, ToggleWeatherReq,
};
use statusboard::state::{ComposeState, FeedItem, FeedState};
use tokio::sync::mpsc;

use crate::board::Board;

/// How long to wait for the first snapshot.
const FIRST_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn show(config_path: &Path, watch: bool, json_output: bool) -> Result<()> {
    let board = Board::open(config_path).await?;
    board.require_user()?;

    let (tx, mut rx) = mpsc::unbounded_channel::<FeedState>();
    let _sub = board.flux.subscribe(FeedState::PATH, move |_, value| {
        if let Some(state) = value.downcast_ref::<FeedState>() {
            let _ = tx.send(state.clone());
        }
    });
    board.flux.emit(OpenFeedReq::PATH, OpenFeedReq {}).await;

    let outcome = if watch {
        watch_feed(&mut rx, json_output).await
    } else {
        first_snapshot(&mut rx)
            .await
            .and_then(|state| print_feed(&state, json_output))
    };

    board.flux.emit(CloseFeedReq::PATH, CloseFeedReq {}).await;
    board.close().await;
    outcome
}

async fn first_snapshot(rx: &mut mpsc::UnboundedReceiver<FeedState>) -> Result<FeedState> {
    let wait = async {
        while let Some(state) = rx.recv().await {
            if !state.loading {
                return Some(state);
            }
        }
        None
    };
    match tokio::time::timeout(FIRST_SNAPSHOT_TIMEOUT, wait).await {
        Ok(Some(state)) => Ok(state),
        Ok(None) => anyhow::bail!("Feed closed before any posts arrived."),
        Err(_) => anyhow::bail!("Timed out waiting for the feed."),
    }
}

async fn watch_feed(rx: &mut mpsc::UnboundedReceiver<FeedState>, json_output: bool) -> Result<()> {
    loop {
        tokio::select! {
            state = rx.recv() => match state {
                Some(state) if !state.loading => {
                    if !json_output {
                        println!("----");
                    }
                    print_feed(&state, json_output)?;
                }
                Some(_) => {}
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

fn print_feed(state: &FeedState, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&state.items)?);
        return Ok(());
    }
    if let Some(error) = &state.error {
        eprintln!("feed error: {}", error);
    }
    if state.items.is_empty() {
        println!("No status updates yet.");
    }
    for item in &state.items {
        print_item(item);
    }
    Ok(())
}

fn print_item(item: &FeedItem) {
    println!("{}  · {}", item.author_email, item.time_label);
    println!("  {}", item.content);
    if let Some(location) = &item.location {
        println!("  📍 {}", location);
    }
    if let Some(weather) = &item.weather {
        println!(
            "  {} {}, {}",
            weather.icon, weather.temperature, weather.description
        );
    }
    println!();
}

pub async fn post(config_path: &Path, text: &str, location: bool, weather: bool) -> Result<()> {
    let board = Board::open(config_path).await?;
    board.require_user()?;

    board
        .flux
        .emit(
            ComposeUpdateReq::PATH,
            ComposeUpdateReq {
                content: text.to_string(),
            },
        )
        .await;
    if location {
        board.flux.emit(ToggleLocationReq::PATH, ToggleLocationReq {}).await;
    }
    if weather {
        board.flux.emit(ToggleWeatherReq::PATH, ToggleWeatherReq {}).await;
    }
    board.flux.emit(PostStatusReq::PATH, PostStatusReq {}).await;

    let compose = board
        .flux
        .get_as::<ComposeState>(ComposeState::PATH)
        .unwrap_or_else(ComposeState::empty);
    board.close().await;

    if let Some(error) = compose.error {
        anyhow::bail!("{}", error);
    }
    println!("Status Posted! Your status has been shared successfully.");
    Ok(())
}
