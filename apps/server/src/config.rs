//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sofabridge_core::Config;

/// Server configuration loaded from YAML with environment overrides.
///
/// Core settings sit at the top level of the YAML file next to `bind_port`:
///
/// ```yaml
/// bind_port: 5005
/// default_zone: Living Room
/// speakers: [192.168.1.20]
/// spotify:
///   region: 3079
/// ```
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to.
    /// Override: `SOFABRIDGE_BIND_PORT` (or `PORT`)
    pub bind_port: u16,

    /// Settings passed through to the core.
    /// Overrides: `SOFABRIDGE_DEFAULT_ZONE`, `SOFABRIDGE_SPEAKERS`
    #[serde(flatten)]
    pub core: Config,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_port: 5005,
            core: Config::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies variable overrides looked up through `var`.
    ///
    /// `SOFABRIDGE_BIND_PORT` wins over the generic `PORT`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let port = var("SOFABRIDGE_BIND_PORT").or_else(|| var("PORT"));
        if let Some(val) = port {
            match val.parse() {
                Ok(port) => self.bind_port = port,
                Err(_) => log::warn!("[Config] Ignoring invalid port '{}'", val),
            }
        }

        if let Some(zone) = var("SOFABRIDGE_DEFAULT_ZONE") {
            self.core.default_zone = zone;
        }

        if let Some(list) = var("SOFABRIDGE_SPEAKERS") {
            self.core.speakers = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_port, 5005);
        assert_eq!(config.core.default_zone, "Port");
        assert!(config.core.discovery_enabled);
    }

    #[test]
    fn yaml_flattens_core_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bind_port: 8080\ndefault_zone: Living Room\nspeakers: [192.168.1.20]\nspotify:\n  region: 3079"
        )
        .unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let config: ServerConfig = serde_yaml::from_str(&content).unwrap();
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.core.default_zone, "Living Room");
        assert_eq!(config.core.speakers, vec!["192.168.1.20"]);
        assert_eq!(config.core.spotify.region, 3079);
        assert_eq!(config.core.volume_step_down, 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_port: [not, a, port]").unwrap();
        let err = ServerConfig::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn overrides_apply_in_order() {
        let mut config = ServerConfig::default();
        config.apply_overrides(vars(&[
            ("PORT", "7000"),
            ("SOFABRIDGE_BIND_PORT", "7001"),
            ("SOFABRIDGE_DEFAULT_ZONE", "Kitchen"),
            ("SOFABRIDGE_SPEAKERS", "10.0.0.2, 10.0.0.3,,"),
        ]));
        assert_eq!(config.bind_port, 7001);
        assert_eq!(config.core.default_zone, "Kitchen");
        assert_eq!(config.core.speakers, vec!["10.0.0.2", "10.0.0.3"]);
    }

    #[test]
    fn generic_port_and_bad_values() {
        let mut config = ServerConfig::default();
        config.apply_overrides(vars(&[("PORT", "6000")]));
        assert_eq!(config.bind_port, 6000);

        config.apply_overrides(vars(&[("SOFABRIDGE_BIND_PORT", "loud")]));
        assert_eq!(config.bind_port, 6000);
    }
}
