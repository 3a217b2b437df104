//! Configuration management (config.toml)
//!
//! Handles loading, saving, and providing defaults for front-end settings.
//! Settings are stored in TOML format in the platform-specific config directory.
//! Custom controller bindings live here too, keyed `bind_port_<n>_<action>`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// File name of the settings file inside [`config_dir`].
pub const CONFIG_FILE: &str = "config.toml";

/// Lowest audio latency the sync path accepts, in milliseconds.
pub const MIN_AUDIO_LATENCY_MS: u32 = 5;

/// Dirty settings are written this long after the last change.
pub const SETTINGS_FLUSH_DELAY: Duration = Duration::from_secs(10);

/// Front-end configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FrontendConfig {
    /// Audio and throttle settings
    #[serde(default)]
    pub audio: AudioConfig,
    /// Controller binding settings
    #[serde(default)]
    pub input: InputConfig,
    /// Storage locations
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Audio and time-warp configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Target output latency in milliseconds (default: 25, minimum: 5)
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u32,
    /// Fast-forward speed multiplier, 0 for unlimited (default: 5.0)
    #[serde(default = "default_fast_rate")]
    pub fast_rate: f32,
    /// Slow-motion speed multiplier (default: 0.3)
    #[serde(default = "default_slow_rate")]
    pub slow_rate: f32,
    /// Fast-forward and slow-motion only last while their hotkey is held (default: false)
    #[serde(default)]
    pub hold_to_throttle: bool,
}

/// Controller binding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InputConfig {
    /// Set once the user changed any binding; templates are no longer applied on their own
    #[serde(default)]
    pub custom_controller_bindings: bool,
    /// Binding strings keyed by `bind_port_<n>_<action>`
    #[serde(default)]
    pub bindings: BTreeMap<String, String>,
}

/// Storage locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    /// Save state directory (default: `<data dir>/saves`)
    #[serde(default)]
    pub saves: Option<PathBuf>,
}

fn default_latency_ms() -> u32 {
    25
}
fn default_fast_rate() -> f32 {
    5.0
}
fn default_slow_rate() -> f32 {
    0.3
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            fast_rate: default_fast_rate(),
            slow_rate: default_slow_rate(),
            hold_to_throttle: false,
        }
    }
}

impl AudioConfig {
    /// Latency with the lower bound applied.
    pub fn effective_latency_ms(&self) -> u32 {
        self.latency_ms.max(MIN_AUDIO_LATENCY_MS)
    }
}

impl PathsConfig {
    /// Resolved save state directory.
    pub fn saves_dir(&self) -> PathBuf {
        match &self.saves {
            Some(dir) => dir.clone(),
            None => data_dir()
                .map(|dir| dir.join("saves"))
                .unwrap_or_else(|| PathBuf::from("saves")),
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.retrolink", "", "Retrolink")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory (save states live below it).
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.retrolink", "", "Retrolink")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads the configuration from the platform's configuration directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> FrontendConfig {
    config_dir()
        .map(|dir| load_from(&dir.join(CONFIG_FILE)))
        .unwrap_or_default()
}

/// Loads the configuration from an explicit path, falling back to defaults.
pub fn load_from(path: &Path) -> FrontendConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
            FrontendConfig::default()
        }),
        Err(_) => FrontendConfig::default(),
    }
}

/// Saves the configuration to the platform's configuration directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn save(config: &FrontendConfig) -> io::Result<()> {
    if let Some(dir) = config_dir() {
        save_to(config, &dir.join(CONFIG_FILE))?;
    }
    Ok(())
}

/// Saves the configuration to an explicit path, creating parent directories.
pub fn save_to(config: &FrontendConfig, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config).map_err(io::Error::other)?;
    std::fs::write(path, content)
}

/// Settings shared between the capture commit path and persistence.
pub type SharedSettings = Arc<Mutex<SettingsStore>>;

/// Lock shared settings, continuing past a poisoned mutex.
pub fn lock_settings(settings: &SharedSettings) -> MutexGuard<'_, SettingsStore> {
    settings.lock().unwrap_or_else(|e| {
        tracing::warn!("Settings mutex poisoned; continuing");
        e.into_inner()
    })
}

/// In-memory settings with a debounced write-back.
#[derive(Debug)]
pub struct SettingsStore {
    config: FrontendConfig,
    path: Option<PathBuf>,
    dirty_since: Option<Instant>,
}

impl SettingsStore {
    pub fn new(config: FrontendConfig, path: Option<PathBuf>) -> Self {
        Self {
            config,
            path,
            dirty_since: None,
        }
    }

    /// Settings from the platform config directory.
    pub fn load_default() -> Self {
        Self::new(load(), config_dir().map(|dir| dir.join(CONFIG_FILE)))
    }

    pub fn shared(self) -> SharedSettings {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut FrontendConfig {
        &mut self.config
    }

    /// Record a change; the write is scheduled relative to `now`.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.dirty_since = Some(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Write the settings if they are dirty and the delay elapsed (or `force`).
    ///
    /// Returns whether a write happened.
    pub fn flush(&mut self, now: Instant, force: bool) -> io::Result<bool> {
        let Some(since) = self.dirty_since else {
            return Ok(false);
        };
        if !force && now.saturating_duration_since(since) < SETTINGS_FLUSH_DELAY {
            return Ok(false);
        }
        if let Some(path) = &self.path {
            save_to(&self.config, path)?;
            tracing::debug!("Settings written to {}", path.display());
        }
        self.dirty_since = None;
        Ok(true)
    }
}
