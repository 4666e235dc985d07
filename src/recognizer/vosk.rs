//! Vosk-backed streaming recognizer.
//!
//! Requires the `vosk` feature and a system libvosk. Model directories are
//! the stock small models, resolved per language by [`super::model_dir`].

use super::{RecognizerOutput, SpeechRecognizer};
use crate::defaults;
use crate::error::{RelayError, Result};
use std::path::Path;
use vosk::{DecodingState, Model, Recognizer};

/// Streaming recognizer over one loaded Vosk model.
///
/// The model must outlive the recognizer, so both are owned here and torn
/// down together when a session ends.
pub struct VoskRecognizer {
    recognizer: Recognizer,
    _model: Model,
}

impl VoskRecognizer {
    /// Loads the model at `model_dir` and prepares a recognizer for the
    /// pipeline's fixed 16kHz mono stream.
    ///
    /// # Errors
    /// Returns `RecognizerInit` when the model or recognizer cannot be
    /// created; libvosk reports details on stderr only.
    pub fn new(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.to_string_lossy();
        let model = Model::new(model_path.as_ref()).ok_or_else(|| RelayError::RecognizerInit {
            message: format!("Failed to load model from {}", model_dir.display()),
        })?;

        let mut recognizer = Recognizer::new(&model, defaults::TARGET_SAMPLE_RATE as f32)
            .ok_or_else(|| RelayError::RecognizerInit {
                message: "Failed to create recognizer".to_string(),
            })?;
        recognizer.set_max_alternatives(0);
        recognizer.set_words(false);

        Ok(Self {
            recognizer,
            _model: model,
        })
    }
}

impl SpeechRecognizer for VoskRecognizer {
    fn accept_block(&mut self, pcm: &[i16]) -> Result<RecognizerOutput> {
        match self.recognizer.accept_waveform(pcm) {
            DecodingState::Finalized => {
                let text = self
                    .recognizer
                    .result()
                    .single()
                    .map(|r| r.text.to_string())
                    .unwrap_or_default();
                if text.is_empty() {
                    Ok(RecognizerOutput::NoResult)
                } else {
                    Ok(RecognizerOutput::Final(text))
                }
            }
            DecodingState::Running => {
                let partial = self.recognizer.partial_result().partial.to_string();
                if partial.is_empty() {
                    Ok(RecognizerOutput::NoResult)
                } else {
                    Ok(RecognizerOutput::Partial(partial))
                }
            }
            DecodingState::Failed => Err(RelayError::Recognition {
                message: "Decoder reported failure for audio block".to_string(),
            }),
        }
    }
}
