//! Configuration management for the cockpit gateway
//!
//! Layered: built-in defaults, then the TOML config file, then `COCKPIT_*`
//! environment variables.

pub mod file;

use std::path::PathBuf;

use secrecy::SecretString;

use crate::assistant::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MODEL};
use crate::{Error, Result};

/// Default wake word
pub const DEFAULT_WAKE_WORD: &str = "peugeot";

/// Default search bias radius in meters
pub const DEFAULT_SEARCH_RADIUS_M: u32 = 50_000;

/// Cockpit gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to data directory (database, cache)
    pub data_dir: PathBuf,

    /// Vehicle identity and energy figures
    pub vehicle: VehicleConfig,

    /// Voice subsystem configuration
    pub voice: VoiceConfig,

    /// Assistant configuration
    pub assistant: AssistantConfig,

    /// Destination search configuration
    pub search: SearchConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Vehicle identity and energy figures
#[derive(Debug, Clone)]
pub struct VehicleConfig {
    /// Display name used in assistant instructions
    pub name: String,

    /// Battery capacity in kWh
    pub battery_kwh: f64,

    /// Rated consumption in kWh per 100 km
    pub consumption_kwh_per_100km: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            name: "E-2008 GT".to_string(),
            battery_kwh: 50.0,
            consumption_kwh_per_100km: 15.5,
        }
    }
}

/// Voice subsystem configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input
    pub enabled: bool,

    /// Wake word activating command capture
    pub wake_word: String,

    /// Capture window after the wake word, in milliseconds
    pub capture_window_ms: u64,

    /// Cool-down after the assistant answers, in milliseconds
    pub cooldown_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wake_word: DEFAULT_WAKE_WORD.to_string(),
            capture_window_ms: crate::voice::CAPTURE_WINDOW_MS,
            cooldown_ms: crate::voice::COOLDOWN_MS,
        }
    }
}

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Model identifier
    pub model: String,

    /// Maximum attempts for rate-limited requests
    pub max_attempts: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Destination search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Search bias radius around the current position, in meters
    pub radius_m: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_SEARCH_RADIUS_M,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// Gemini API key (assistant)
    pub gemini: Option<SecretString>,

    /// Maps platform API key (places + directions)
    pub maps: Option<SecretString>,
}

impl Config {
    /// Load configuration from defaults, the config file, and environment
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration, optionally forcing voice off
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let overlay = file::load_config_file();
        let mut config = Self::from_overlay(&overlay);

        config.apply_env();

        if disable_voice {
            config.voice.enabled = false;
        }

        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            Error::Config(format!(
                "cannot create data directory {}: {e}",
                config.data_dir.display()
            ))
        })?;

        Ok(config)
    }

    /// Build a config from defaults plus a file overlay
    #[must_use]
    pub fn from_overlay(overlay: &file::CockpitConfigFile) -> Self {
        let mut vehicle = VehicleConfig::default();
        if let Some(name) = &overlay.vehicle.name {
            vehicle.name.clone_from(name);
        }
        if let Some(kwh) = overlay.vehicle.battery_kwh {
            vehicle.battery_kwh = kwh;
        }
        if let Some(consumption) = overlay.vehicle.consumption_kwh_per_100km {
            vehicle.consumption_kwh_per_100km = consumption;
        }

        let mut voice = VoiceConfig::default();
        if let Some(enabled) = overlay.voice.enabled {
            voice.enabled = enabled;
        }
        if let Some(wake_word) = &overlay.voice.wake_word {
            voice.wake_word.clone_from(wake_word);
        }
        if let Some(ms) = overlay.voice.capture_window_ms {
            voice.capture_window_ms = ms;
        }
        if let Some(ms) = overlay.voice.cooldown_ms {
            voice.cooldown_ms = ms;
        }

        let mut assistant = AssistantConfig::default();
        if let Some(model) = &overlay.assistant.model {
            assistant.model.clone_from(model);
        }
        if let Some(attempts) = overlay.assistant.max_attempts {
            assistant.max_attempts = attempts;
        }

        let mut search = SearchConfig::default();
        if let Some(radius) = overlay.search.radius_m {
            search.radius_m = radius;
        }

        let api_keys = ApiKeys {
            gemini: overlay.api_keys.gemini.clone().map(SecretString::from),
            maps: overlay.api_keys.maps.clone().map(SecretString::from),
        };

        Self {
            data_dir: default_data_dir(),
            vehicle,
            voice,
            assistant,
            search,
            api_keys,
        }
    }

    /// Apply `COCKPIT_*` environment variable overrides
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("COCKPIT_GEMINI_API_KEY") {
            if !key.is_empty() {
                self.api_keys.gemini = Some(SecretString::from(key));
            }
        }
        if let Ok(key) = std::env::var("COCKPIT_MAPS_API_KEY") {
            if !key.is_empty() {
                self.api_keys.maps = Some(SecretString::from(key));
            }
        }
        if let Ok(wake_word) = std::env::var("COCKPIT_WAKE_WORD") {
            if !wake_word.trim().is_empty() {
                self.voice.wake_word = wake_word;
            }
        }
        if let Ok(model) = std::env::var("COCKPIT_LLM_MODEL") {
            if !model.is_empty() {
                self.assistant.model = model;
            }
        }
        if std::env::var("COCKPIT_DISABLE_VOICE").is_ok_and(|v| v == "1" || v == "true") {
            self.voice.enabled = false;
        }
        if let Ok(dir) = std::env::var("COCKPIT_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
    }
}

/// Default data directory: `~/.local/share/cockpit/` (platform equivalent)
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".cockpit"),
        |dirs| dirs.data_dir().join("cockpit"),
    )
}
