use std::net::SocketAddr;
use std::path::Path;

use config_file::FromConfigFile;
use serde::Deserialize;

use crate::channels::Channels;
use crate::error::Result;
use crate::lighthandler::TransitionConfig;
use crate::status::StatusStyles;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OlaConfig {
    pub address: SocketAddr,
    pub start_slot: usize,
}

impl Default for OlaConfig {
    fn default() -> Self {
        OlaConfig {
            address: SocketAddr::from(([127, 0, 0, 1], 7770)),
            start_slot: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_color: String,
    pub lights_enabled: bool,
    pub transitions: TransitionConfig,
    pub ola: OlaConfig,
    pub statuses: StatusStyles,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_color: "#00000000".to_string(),
            lights_enabled: true,
            transitions: TransitionConfig::default(),
            ola: OlaConfig::default(),
            statuses: StatusStyles::default(),
        }
    }
}

impl Config {
    /// Loads and validates a config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Config> {
        let config = Config::from_config_file(path)?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.default_color()?;
        self.statuses.validate()
    }

    pub fn default_color(&self) -> Result<Channels> {
        Channels::from_hex(&self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternPreset;
    use std::fs;
    use std::path::PathBuf;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "rgbstatus-{}-{name}.toml",
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_match_plugin_settings() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_color().unwrap(), Channels::zero());
        assert_eq!(config.transitions.refresh_interval_ms, 20);
        assert_eq!(config.transitions.transition_ms, 200);
        assert!(config.transitions.enabled);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let path = write_config(
            "partial",
            r##"
lights_enabled = false

[transitions]
transition_ms = 500

[ola]
start_slot = 16

[statuses.error]
color = "#FF00FF"
pattern = "fast_pulsing"
"##,
        );
        let config = Config::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(!config.lights_enabled);
        assert_eq!(config.transitions.transition_ms, 500);
        assert_eq!(config.transitions.refresh_interval_ms, 20);
        assert_eq!(config.ola.start_slot, 16);
        assert_eq!(config.ola.address, OlaConfig::default().address);
        assert_eq!(config.statuses.error.pattern, PatternPreset::FastPulsing);
        assert_eq!(config.statuses.idle, StatusStyles::default().idle);
    }

    #[test]
    fn invalid_color_is_rejected() {
        let path = write_config("badcolor", "default_color = \"#12345\"\n");
        let result = Config::load(&path);
        fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("rgbstatus-does-not-exist.toml");
        assert!(Config::load(&path).is_err());
    }
}
