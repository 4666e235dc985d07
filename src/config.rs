use crate::synth::voice::{Gender, Language};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub recognition: RecognitionConfig,
    pub synthesis: SynthesisConfig,
}

/// Audio device configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device name; `None` uses the system default.
    pub input_device: Option<String>,
    /// Output device name; `None` prefers a virtual cable, then default.
    pub output_device: Option<String>,
    /// Record the converted recognizer input to a WAV artifact.
    pub debug_dump: bool,
}

/// Speech recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Directory holding per-language model subdirectories.
    pub models_dir: PathBuf,
    pub language: Language,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Explicit synthesizer binary path; `None` for discovery.
    pub binary: Option<PathBuf>,
    pub gender: Gender,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(crate::defaults::MODELS_DIR),
            language: Language::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields use default values.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults.
    ///
    /// A missing file is normal and silent; a present-but-broken file is
    /// logged before falling back.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "revoice: ignoring invalid config {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - REVOICE_INPUT_DEVICE → audio.input_device
    /// - REVOICE_OUTPUT_DEVICE → audio.output_device
    /// - REVOICE_MODELS_DIR → recognition.models_dir
    /// - REVOICE_SYNTH_BIN → synthesis.binary
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("REVOICE_INPUT_DEVICE")
            && !device.is_empty()
        {
            self.audio.input_device = Some(device);
        }

        if let Ok(device) = std::env::var("REVOICE_OUTPUT_DEVICE")
            && !device.is_empty()
        {
            self.audio.output_device = Some(device);
        }

        if let Ok(dir) = std::env::var("REVOICE_MODELS_DIR")
            && !dir.is_empty()
        {
            self.recognition.models_dir = PathBuf::from(dir);
        }

        if let Ok(bin) = std::env::var("REVOICE_SYNTH_BIN")
            && !bin.is_empty()
        {
            self.synthesis.binary = Some(PathBuf::from(bin));
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/revoice/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("revoice")
            .join("config.toml")
    }
}
