//! Configuration system
//!
//! Mixer settings are plain serde structs that can be read from and written
//! to `.toml` or `.ron` files through the [`Config`] trait.

pub use serde::{Serialize, Deserialize};

use std::path::PathBuf;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Playback engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Real device output through rodio
    Rodio,
    /// Silent engine driven by a virtual clock
    Headless,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "rodio") {
            Self::Rodio
        } else {
            Self::Headless
        }
    }
}

/// Mixer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// When false the mixer is constructed disabled and never opens a device
    pub enabled: bool,
    /// Playback engine to open
    pub backend: BackendKind,
    /// Number of effect channels in the pool
    pub effect_channels: usize,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Number of output channels (1=mono, 2=stereo)
    pub output_channels: u16,
    /// Device buffer size in frames
    pub buffer_size: usize,
    /// Initial music volume (0.0 to 1.0)
    pub music_volume: f32,
    /// Prefixes tried in order when opening clip files
    pub search_paths: Vec<PathBuf>,
}

/// Default number of effect channels
pub const DEFAULT_EFFECT_CHANNELS: usize = 8;

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: BackendKind::default(),
            effect_channels: DEFAULT_EFFECT_CHANNELS,
            sample_rate: 44100,
            output_channels: 2,
            buffer_size: 4096,
            music_volume: 1.0,
            search_paths: vec![PathBuf::from("Resources/"), PathBuf::from("../Resources/")],
        }
    }
}

impl Config for MixerConfig {}

impl MixerConfig {
    /// Configuration for a silent mixer with the given pool size
    pub fn headless(effect_channels: usize) -> Self {
        Self {
            backend: BackendKind::Headless,
            effect_channels,
            ..Self::default()
        }
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.effect_channels == 0 {
            return Err(ConfigError::Parse("effect_channels must be at least 1".to_string()));
        }
        if !self.music_volume.is_finite() {
            return Err(ConfigError::Parse("music_volume must be a finite number".to_string()));
        }
        if self.output_channels == 0 || self.sample_rate == 0 {
            return Err(ConfigError::Parse("output format must be non-zero".to_string()));
        }
        Ok(())
    }
}
