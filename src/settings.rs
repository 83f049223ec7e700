use anyhow::{Context, Result};
use log::warn;
use serde::{Serialize, Deserialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use crate::core::synth::DEFAULT_MASTER_VOLUME;
use crate::core::VoiceKind;

const APP_DIR: &str = "keysynth";
const SETTINGS_FILE: &str = "settings.json";

/// User settings, stored as JSON in the platform config directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub voice: VoiceKind,
    pub master_volume: f64,
    pub output_device: Option<String>,
    /// How long a key may go without a repeat before it counts as released,
    /// for terminals that cannot report releases
    pub release_timeout_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            voice: VoiceKind::default(),
            master_volume: DEFAULT_MASTER_VOLUME,
            output_device: None,
            release_timeout_ms: 600,
        }
    }
}

impl AppSettings {
    pub fn settings_dir() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        path.push(APP_DIR);
        Ok(path)
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::settings_dir()?.join(SETTINGS_FILE))
    }

    /// Load settings from `path`, falling back to defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path)
            .with_context(|| format!("Failed to open settings file {}", path.display()))?;
        let settings = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .context("Failed to create settings directory")?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create settings file {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .context("Failed to write settings")?;
        Ok(())
    }

    /// Load from the platform config directory, or use defaults when there is none
    pub fn load() -> Result<Self> {
        Self::load_in(dirs::config_dir())
    }

    fn load_in(config_dir: Option<PathBuf>) -> Result<Self> {
        match config_dir {
            Some(dir) => Self::load_from(&dir.join(APP_DIR).join(SETTINGS_FILE)),
            None => {
                warn!("Could not find config directory, using default settings");
                Ok(Self::default())
            },
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }
}
