//! Persisted configuration
//!
//! One named record holding the [`TtsConfig`], read at startup and on
//! demand, written only via the explicit save path. Loading merges the file
//! (and `READALOUD_*` environment overrides) over the hard-coded defaults;
//! a missing or unreadable file degrades to the defaults rather than
//! failing startup.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use thiserror::Error;
use tracing::warn;

use readaloud_tts::TtsConfig;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("readaloud")
            .join("settings.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> TtsConfig {
        let defaults = TtsConfig::default();
        let mut builder = Config::builder();

        // Seed every key so a partial file falls back field-by-field.
        builder = builder
            .set_default("api_url", defaults.api_url.clone())
            .unwrap()
            .set_default("api_key", defaults.api_key.clone())
            .unwrap()
            .set_default("model", defaults.model.clone())
            .unwrap()
            .set_default("voice", defaults.voice.clone())
            .unwrap()
            .set_default("speed", defaults.speed as f64)
            .unwrap()
            .set_default("volume", defaults.volume as f64)
            .unwrap();

        if self.path.exists() {
            builder = builder.add_source(File::from(self.path.as_path()).required(false));
        }
        builder = builder.add_source(Environment::with_prefix("READALOUD").separator("__"));

        match builder.build().and_then(|c| c.try_deserialize::<TtsConfig>()) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %self.path.display(), "failed to load settings, using defaults: {e}");
                defaults
            }
        }
    }

    pub fn save(&self, config: &TtsConfig) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }
}
