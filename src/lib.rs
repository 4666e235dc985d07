//! revoice - real-time voice relay
//!
//! Captures microphone speech, recognizes it incrementally and re-voices
//! it through an external speech synthesizer, played back serially so
//! utterances never overlap.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod recognizer;
pub mod synth;

// Core traits (capture → recognize → synthesize → play)
pub use audio::capture::CaptureSource;
pub use audio::playback::PlaybackSink;
pub use recognizer::{RecognizerOutput, SpeechRecognizer};
pub use synth::engine::SynthesisEngine;

// Pipeline
pub use pipeline::{PipelineState, RelayBackend, RelayController, RelayOptions};

// Error handling
pub use error::{RelayError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
