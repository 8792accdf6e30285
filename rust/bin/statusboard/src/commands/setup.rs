//! Interactive config setup.

use std::path::Path;

use anyhow::Result;
use statusboard_core::AppConfig;

use super::prompt_default;

/// Ask for backend keys and write the config file. Existing values are
/// offered as defaults.
pub fn run(config_path: &Path) -> Result<()> {
    let mut config = AppConfig::load(config_path)?;
    println!("Configuring {}", config_path.display());
    println!("Leave the Firebase API key empty to use the in-memory demo board.");

    let fb = &mut config.firebase;
    fb.api_key = prompt_default("Firebase API key", &fb.api_key)?;
    if !fb.api_key.is_empty() {
        fb.project_id = prompt_default("Firebase project id", &fb.project_id)?;
        let domain = if fb.auth_domain.is_empty() && !fb.project_id.is_empty() {
            format!("{}.firebaseapp.com", fb.project_id)
        } else {
            fb.auth_domain.clone()
        };
        fb.auth_domain = prompt_default("Firebase auth domain", &domain)?;
    }

    config.weather.api_key = prompt_default("OpenWeatherMap API key", &config.weather.api_key)?;
    config.feed.collection = prompt_default("Feed collection", &config.feed.collection)?;

    config.save(config_path)?;
    println!("Saved.");
    if !config.firebase.is_configured() {
        println!("Firebase is not fully configured; the CLI will run on the demo board.");
    }
    Ok(())
}
