//! Configuration file management for vrec.
//!
//! Loads and saves the application configuration from a TOML file in the
//! user's config directory. A missing file is replaced with defaults on
//! first run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `vrec list-devices`
    /// - device name from `vrec list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested recording sample rate in Hz (actual may differ by device)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    44100
}

impl Default for AudioConfig {
    fn default() -> Self {
        AudioConfig {
            device: default_device(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// Recorder timing and waveform configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Timer tick period in milliseconds; each tick samples one amplitude
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Width of one waveform bar, in display units
    #[serde(default = "default_bar_width")]
    pub bar_width: f32,
    /// Gap between waveform bars, in display units
    #[serde(default = "default_bar_gap")]
    pub bar_gap: f32,
    /// Maximum waveform bar height, in display units
    #[serde(default = "default_wave_height")]
    pub wave_height: f32,
    /// chrono format string new take names are derived from
    #[serde(default = "default_name_format")]
    pub name_format: String,
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_bar_width() -> f32 {
    9.0
}

fn default_bar_gap() -> f32 {
    6.0
}

fn default_wave_height() -> f32 {
    400.0
}

fn default_name_format() -> String {
    "take_%Y%m%d_%H%M%S".to_string()
}

impl Default for RecorderConfig {
    fn default() -> Self {
        RecorderConfig {
            tick_interval_ms: default_tick_interval_ms(),
            bar_width: default_bar_width(),
            bar_gap: default_bar_gap(),
            wave_height: default_wave_height(),
            name_format: default_name_format(),
        }
    }
}

/// Take storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory takes are recorded into. Defaults to ~/.local/share/vrec/takes
    #[serde(default)]
    pub takes_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VrecConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl VrecConfig {
    /// Loads configuration from the user's config directory, writing a
    /// default file on first run.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the config file cannot be read or written
    /// - If the TOML is malformed
    pub fn load() -> Result<Self, anyhow::Error> {
        let config_path = config_path()?;
        if !config_path.exists() {
            let config = VrecConfig::default();
            config.save()?;
            tracing::info!("Default configuration written: {}", config_path.display());
            return Ok(config);
        }
        let config_content = fs::read_to_string(&config_path)?;
        let config: VrecConfig = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> Result<(), anyhow::Error> {
        let config_path = config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }

    /// Directory takes are recorded into, resolving the default when none is
    /// configured.
    ///
    /// # Errors
    /// - If the home directory cannot be determined
    pub fn takes_dir(&self) -> Result<PathBuf, anyhow::Error> {
        if let Some(dir) = &self.storage.takes_dir {
            return Ok(dir.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".local/share/vrec/takes"))
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.recorder.tick_interval_ms)
    }
}

/// Retrieves the path to the config file, creating the config directory if
/// needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn config_path() -> Result<PathBuf, std::io::Error> {
    let home = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "Could not find home directory")
    })?;
    let config_dir = home.join(".config").join("vrec");
    fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("vrec.toml"))
}

/// Directory log files are written to: the user's state directory, `vrec`
/// subdirectory. Created if missing.
///
/// # Errors
/// - If neither a state nor a home directory can be determined
/// - If the directory cannot be created
pub fn log_dir() -> Result<PathBuf, std::io::Error> {
    let base = dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "Could not find home directory")
        })?;
    let dir = base.join("vrec");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: VrecConfig = toml::from_str("").unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.recorder.tick_interval_ms, 100);
        assert_eq!(config.recorder.bar_width, 9.0);
        assert_eq!(config.recorder.bar_gap, 6.0);
        assert!(config.storage.takes_dir.is_none());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: VrecConfig = toml::from_str(
            "[recorder]\ntick_interval_ms = 50\n\n[audio]\ndevice = \"1\"\n",
        )
        .unwrap();
        assert_eq!(config.recorder.tick_interval_ms, 50);
        assert_eq!(config.audio.device, "1");
        assert_eq!(config.audio.sample_rate, 44100);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = VrecConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: VrecConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.recorder.name_format, config.recorder.name_format);
    }
}
