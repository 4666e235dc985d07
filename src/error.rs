//! Error types for revoice.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    // Setup errors — these abort the enable transition
    #[error("Recognition model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Failed to initialize recognizer: {message}")]
    RecognizerInit { message: String },

    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    // Runtime capture errors
    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    #[error("Unsupported channel count: {channels}")]
    UnsupportedChannelCount { channels: u16 },

    // Runtime recognition errors
    #[error("Recognition error: {message}")]
    Recognition { message: String },

    // Runtime synthesis errors
    #[error("Synthesis tool not found: {tool}")]
    SynthesisToolNotFound { tool: String },

    #[error("Synthesis failed: {message}")]
    Synthesis { message: String },

    #[error("Playback failed: {message}")]
    Playback { message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, RelayError>;
