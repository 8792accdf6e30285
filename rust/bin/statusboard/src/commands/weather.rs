//! Location and weather preview.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use statusboard::request::RefreshEnrichmentReq;
use statusboard::state::EnrichmentState;
use statusboard_collab::{Coordinates, FixedLocation};
use statusboard_core::AppConfig;

use crate::board::Board;

/// Run the enrichment preview, optionally at explicit coordinates.
pub async fn show(config_path: &Path, at: Option<(f64, f64)>, json_output: bool) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let board = Board::open_with(config, |collab| {
        if let Some((lat, lon)) = at {
            let label = format!("{:.4}, {:.4}", lat, lon);
            collab.location = Arc::new(FixedLocation::new(Coordinates::new(lat, lon), label));
        }
    })
    .await?;

    board
        .flux
        .emit(RefreshEnrichmentReq::PATH, RefreshEnrichmentReq {})
        .await;
    let state = board
        .flux
        .get_as::<EnrichmentState>(EnrichmentState::PATH)
        .unwrap_or_default();
    board.close().await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }
    if let Some(error) = state.error {
        anyhow::bail!("{}", error);
    }
    if let Some(location) = &state.location {
        println!(
            "📍 {} ({:.4}, {:.4})",
            location.address, location.coordinates.latitude, location.coordinates.longitude
        );
    }
    if let Some(weather) = &state.weather {
        println!("{} {}  {}", weather.icon, weather.temperature, weather.description);
        if let Some(humidity) = &weather.humidity {
            println!("   humidity {}", humidity);
        }
        if let Some(wind) = &weather.wind_speed {
            println!("   wind {}", wind);
        }
        if !state.weather_live {
            eprintln!("note: live weather unavailable, showing fallback reading");
        }
    }
    Ok(())
}
