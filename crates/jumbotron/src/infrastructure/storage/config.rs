//! TOML-based wall configuration.
//!
//! A wall file lists the outputs and the frame-loop settings:
//!
//! ```toml
//! [wall]
//! tick_interval_ms = 16
//! frames = 60
//! log_level = "info"
//! output_dir = "out"
//!
//! [[outputs]]
//! name = "left"
//! x = 0
//! y = 0
//! width = 320
//! height = 180
//!
//! [[outputs]]
//! name = "right"
//! x = 320
//! y = 0
//! width = 640
//! height = 360
//! scale = 2
//! ```
//!
//! # Serde default values
//!
//! Every `[wall]` field carries `#[serde(default = "...")]`, so an empty
//! section (or an absent file) still produces a usable configuration.
//! `scale` is optional per output; leaving it out means the output shows the
//! buffer one-to-one.

use std::path::{Path, PathBuf};

use jumbotron_core::Rectangle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level wall configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallConfig {
    #[serde(default)]
    pub wall: WallSettings,
    #[serde(default = "default_outputs")]
    pub outputs: Vec<OutputEntry>,
}

/// Frame loop and export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallSettings {
    /// Milliseconds between ticks.  `0` runs as fast as the runtime allows.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Frames the demo draws before exporting.
    #[serde(default = "default_frames")]
    pub frames: u64,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory the demo writes its PNG files into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// One physical output on the wall.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputEntry {
    /// Name used for logging and for the exported file name.
    pub name: String,
    /// Left edge in the shared coordinate space.
    pub x: i32,
    /// Top edge in the shared coordinate space.
    pub y: i32,
    /// Physical width in pixels.
    pub width: u32,
    /// Physical height in pixels.
    pub height: u32,
    /// Integer scale factor; absent means unscaled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
}

impl OutputEntry {
    /// On-screen rectangle of this output.
    pub fn layout(&self) -> Rectangle {
        Rectangle::from_xywh(self.x, self.y, self.width, self.height)
    }

    /// The scale as the raw tag an output reports.
    pub fn scale_tag(&self) -> Option<String> {
        self.scale.map(|s| s.to_string())
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_tick_interval_ms() -> u64 {
    16
}
fn default_frames() -> u64 {
    60
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}
fn default_outputs() -> Vec<OutputEntry> {
    vec![
        OutputEntry {
            name: "left".to_string(),
            x: 0,
            y: 0,
            width: 320,
            height: 180,
            scale: None,
        },
        OutputEntry {
            name: "right".to_string(),
            x: 320,
            y: 0,
            width: 320,
            height: 180,
            scale: None,
        },
    ]
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            wall: WallSettings::default(),
            outputs: default_outputs(),
        }
    }
}

impl Default for WallSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            frames: default_frames(),
            log_level: default_log_level(),
            output_dir: default_output_dir(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads a `WallConfig` from `path`, returning `WallConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<WallConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WallConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &WallConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
