//! A status board session for one CLI invocation.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use flux::Flux;
use statusboard::request::{InitializeReq, ShutdownReq};
use statusboard::state::AuthState;
use statusboard::{register_handlers, Collaborators, StatusBoard};
use statusboard_collab::UserIdentity;
use statusboard_core::AppConfig;

pub struct Board {
    pub flux: Flux,
    pub config: AppConfig,
}

impl Board {
    /// Load config, wire the board and run `app/initialize`.
    pub async fn open(config_path: &Path) -> Result<Self> {
        let config = AppConfig::load(config_path)?;
        Self::open_with(config, |_| {}).await
    }

    /// Like `open`, with a chance to swap collaborators first.
    pub async fn open_with<F>(config: AppConfig, customize: F) -> Result<Self>
    where
        F: FnOnce(&mut Collaborators),
    {
        if !config.firebase.is_configured() {
            eprintln!(
                "note: no backend configured (run `statusboard setup`); \
                 using an in-memory board that is discarded on exit"
            );
        }
        let mut collab = Collaborators::from_config(&config);
        customize(&mut collab);
        let board = Arc::new(StatusBoard::new(
            collab,
            statusboard::BoardSettings::from_config(&config.feed),
        ));

        let flux = Flux::new();
        register_handlers(&flux, board);
        flux.emit(InitializeReq::PATH, InitializeReq {}).await;
        Ok(Self { flux, config })
    }

    pub fn auth(&self) -> AuthState {
        self.flux
            .get_as::<AuthState>(AuthState::PATH)
            .unwrap_or_else(AuthState::loading)
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.auth().user
    }

    /// The signed-in user, or an error telling how to sign in.
    pub fn require_user(&self) -> Result<UserIdentity> {
        self.user()
            .ok_or_else(|| anyhow::anyhow!("Not signed in. Run `statusboard sign-in`."))
    }

    pub async fn close(self) {
        self.flux.emit(ShutdownReq::PATH, ShutdownReq {}).await;
    }
}
