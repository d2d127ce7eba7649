//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root: the single place where the
//! speaker client, the directory and the services are instantiated and wired
//! together. Tests wire the same services around in-memory collaborators
//! through [`BootstrappedServices::with_collaborators`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::api::AppState;
use crate::config::Config;
use crate::error::{ZoneError, ZoneResult};
use crate::media::MediaTranslator;
use crate::protocol_constants::SOAP_TIMEOUT_SECS;
use crate::services::{LibraryService, MusicShortcuts, PlaybackController, ZoneReconciler};
use crate::sonos::discovery::SsdpConfig;
use crate::sonos::traits::{CommandGateway, MediaLibrary, PlayerDirectory};
use crate::sonos::{SonosClientImpl, SonosDirectory};

/// Container for all bootstrapped services.
#[derive(Clone)]
pub struct BootstrappedServices {
    /// Live topology and room resolution.
    pub directory: Arc<dyn PlayerDirectory>,
    /// Group membership changes.
    pub reconciler: Arc<ZoneReconciler>,
    /// Transport, volume, mute and per-room reads.
    pub playback: Arc<PlaybackController>,
    /// Favorites, playlists, queue and music services.
    pub library: Arc<LibraryService>,
    /// Default-zone shortcuts of the remote front-end.
    pub music: Arc<MusicShortcuts>,
}

impl BootstrappedServices {
    /// Wires the services around the given collaborators.
    pub fn with_collaborators(
        directory: Arc<dyn PlayerDirectory>,
        gateway: Arc<dyn CommandGateway>,
        library: Arc<dyn MediaLibrary>,
        config: &Config,
    ) -> Self {
        let reconciler = Arc::new(ZoneReconciler::new(
            Arc::clone(&directory),
            Arc::clone(&gateway),
        ));
        let playback = Arc::new(PlaybackController::new(
            Arc::clone(&directory),
            Arc::clone(&gateway),
        ));
        let library = Arc::new(LibraryService::new(
            Arc::clone(&directory),
            Arc::clone(&gateway),
            library,
            MediaTranslator::new(config.spotify.clone()),
        ));
        let music = Arc::new(MusicShortcuts::new(
            Arc::clone(&directory),
            Arc::clone(&reconciler),
            Arc::clone(&playback),
            Arc::clone(&library),
            config.default_zone.clone(),
            config.volume_step_up,
            config.volume_step_down,
        ));

        Self {
            directory,
            reconciler,
            playback,
            library,
            music,
        }
    }

    /// Builds the HTTP state over these services.
    pub fn app_state(&self) -> AppState {
        AppState {
            reconciler: Arc::clone(&self.reconciler),
            playback: Arc::clone(&self.playback),
            library: Arc::clone(&self.library),
            music: Arc::clone(&self.music),
        }
    }
}

/// Creates the shared HTTP client for all Sonos communication.
fn create_http_client() -> ZoneResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(SOAP_TIMEOUT_SECS))
        .build()
        .map_err(|e| ZoneError::Internal(format!("failed to create HTTP client: {}", e)))
}

/// Bootstraps all services against the real speakers.
///
/// One `SonosClientImpl` serves as directory client, command gateway and
/// media library. No network traffic happens here; the first request
/// triggers discovery if no speaker address is configured.
pub fn bootstrap_services(config: &Config) -> ZoneResult<BootstrappedServices> {
    config.validate().map_err(ZoneError::InvalidRequest)?;

    let ssdp = SsdpConfig::with_timeout(Duration::from_millis(config.discovery_timeout_ms));
    let client = Arc::new(SonosClientImpl::with_ssdp_config(create_http_client()?, ssdp));
    let directory = Arc::new(SonosDirectory::new(
        client.clone(),
        config.speakers.clone(),
        config.discovery_enabled,
    ));

    log::info!(
        "[Bootstrap] {} seed speaker(s), discovery {}, default zone '{}'",
        config.speakers.len(),
        if config.discovery_enabled { "on" } else { "off" },
        config.default_zone
    );

    Ok(BootstrappedServices::with_collaborators(
        directory,
        client.clone(),
        client,
        config,
    ))
}
