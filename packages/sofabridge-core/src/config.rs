//! Core configuration consumed by [`crate::bootstrap`].

use serde::{Deserialize, Serialize};

/// Music-service parameters used when translating Spotify URIs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Sonos service id of Spotify (`sid`).
    pub service_id: u32,
    /// Account serial number (`sn`).
    pub serial_number: u32,
    /// Regional service type used in the metadata descriptor
    /// (`SA_RINCON{region}_X_#Svc{region}-0-Token`). 2311 is Europe, 3079 US.
    pub region: u32,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            service_id: 9,
            serial_number: 9,
            region: 2311,
        }
    }
}

/// Configuration for the SofaBridge core.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    // Discovery
    /// Speaker addresses known up front. With none, SSDP finds the first one.
    pub speakers: Vec<String>,
    /// Run SSDP when no speaker address is known.
    pub discovery_enabled: bool,
    /// SSDP listening window (milliseconds).
    pub discovery_timeout_ms: u64,

    // Shortcuts
    /// Room that leads groups created by the music shortcuts.
    pub default_zone: String,
    /// Group volume step for `volume/up`.
    pub volume_step_up: i32,
    /// Group volume step for `volume/down` (applied as a decrease).
    pub volume_step_down: i32,

    // Services
    pub spotify: SpotifyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speakers: Vec::new(),
            discovery_enabled: true,
            discovery_timeout_ms: 3000,
            default_zone: "Port".to_string(),
            volume_step_up: 1,
            volume_step_down: 2,
            spotify: SpotifyConfig::default(),
        }
    }
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_zone.trim().is_empty() {
            return Err("default_zone must not be empty".to_string());
        }
        if self.volume_step_up <= 0 || self.volume_step_down <= 0 {
            return Err("volume steps must be positive".to_string());
        }
        if !self.discovery_enabled && self.speakers.is_empty() {
            return Err("discovery is disabled and no speakers are configured".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.volume_step_up, 1);
        assert_eq!(config.volume_step_down, 2);
        assert_eq!(config.spotify.region, 2311);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"speakers": ["10.0.0.5"], "spotify": {"region": 3079}}"#)
                .unwrap();
        assert_eq!(config.speakers, vec!["10.0.0.5"]);
        assert_eq!(config.spotify.region, 3079);
        assert_eq!(config.spotify.service_id, 9);
        assert_eq!(config.default_zone, "Port");
    }

    #[test]
    fn rejects_unreachable_setup() {
        let config = Config {
            discovery_enabled: false,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            volume_step_down: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
