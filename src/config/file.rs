//! TOML configuration file loading
//!
//! Supports `~/.config/cockpit/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct CockpitConfigFile {
    /// Vehicle identity and energy figures
    #[serde(default)]
    pub vehicle: VehicleFileConfig,

    /// Voice subsystem configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Assistant (language model) configuration
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// Destination search configuration
    #[serde(default)]
    pub search: SearchFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Vehicle identity configuration
#[derive(Debug, Default, Deserialize)]
pub struct VehicleFileConfig {
    /// Display name used in assistant instructions (e.g. "E-2008 GT")
    pub name: Option<String>,

    /// Battery capacity in kWh
    pub battery_kwh: Option<f64>,

    /// Rated consumption in kWh per 100 km
    pub consumption_kwh_per_100km: Option<f64>,
}

/// Voice subsystem configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Enable the voice subsystem
    pub enabled: Option<bool>,

    /// Wake word (e.g. "peugeot")
    pub wake_word: Option<String>,

    /// Capture window after the wake word, in milliseconds
    pub capture_window_ms: Option<u64>,

    /// Cool-down after the assistant answers, in milliseconds
    pub cooldown_ms: Option<u64>,
}

/// Assistant configuration
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Model identifier (e.g. "gemini-3-pro-preview")
    pub model: Option<String>,

    /// Maximum attempts for rate-limited requests
    pub max_attempts: Option<u32>,
}

/// Destination search configuration
#[derive(Debug, Default, Deserialize)]
pub struct SearchFileConfig {
    /// Search bias radius around the current position, in meters
    pub radius_m: Option<u32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    /// Gemini API key
    pub gemini: Option<String>,

    /// Maps platform API key (places + directions)
    pub maps: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `CockpitConfigFile::default()` if the file doesn't exist or can't
/// be parsed.
#[must_use]
pub fn load_config_file() -> CockpitConfigFile {
    let Some(path) = config_file_path() else {
        return CockpitConfigFile::default();
    };

    if !path.exists() {
        return CockpitConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                CockpitConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            CockpitConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/cockpit/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("cockpit").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let content = r#"
            [voice]
            wake_word = "lion"

            [api_keys]
            gemini = "key"
        "#;

        let parsed: CockpitConfigFile = toml::from_str(content).unwrap();
        assert_eq!(parsed.voice.wake_word.as_deref(), Some("lion"));
        assert!(parsed.voice.enabled.is_none());
        assert_eq!(parsed.api_keys.gemini.as_deref(), Some("key"));
        assert!(parsed.vehicle.name.is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let parsed: CockpitConfigFile = toml::from_str("").unwrap();
        assert!(parsed.assistant.model.is_none());
        assert!(parsed.search.radius_m.is_none());
    }
}
