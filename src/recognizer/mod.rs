//! Streaming speech recognition boundary.
//!
//! The engine-specific result formats are decoded here, at the boundary,
//! into [`RecognizerOutput`] so the recognition worker never inspects raw
//! recognizer fields.

#[cfg(feature = "vosk")]
pub mod vosk;

use crate::error::{RelayError, Result};
use crate::synth::voice::Language;
use std::path::{Path, PathBuf};

/// One step of incremental recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerOutput {
    /// An utterance boundary was reached; this is its authoritative text.
    Final(String),
    /// In-progress hypothesis for the current utterance; may still change.
    Partial(String),
    /// Nothing to report for this block.
    NoResult,
}

/// Trait for incremental speech recognizers.
///
/// The recognizer instance is owned and touched exclusively by the
/// recognition worker thread; implementations do not need interior
/// synchronization.
pub trait SpeechRecognizer: Send {
    /// Feeds one mono 16kHz PCM16 block and returns the decoded outcome.
    fn accept_block(&mut self, pcm: &[i16]) -> Result<RecognizerOutput>;
}

/// Builds a recognizer from a resolved model directory.
pub type RecognizerFactory =
    Box<dyn Fn(&Path) -> Result<Box<dyn SpeechRecognizer>> + Send + Sync>;

/// Resolves the model directory for a language under `models_root`.
///
/// Model directories follow the upstream naming convention, one
/// subdirectory per supported language.
///
/// # Errors
/// Returns `RelayError::ModelNotFound` when the directory is absent.
pub fn model_dir(models_root: &Path, language: Language) -> Result<PathBuf> {
    let path = models_root.join(language.model_dir_name());
    if path.is_dir() {
        Ok(path)
    } else {
        Err(RelayError::ModelNotFound {
            path: path.display().to_string(),
        })
    }
}

/// Mock recognizer for testing.
///
/// Replays a scripted sequence of outputs, one per `accept_block` call,
/// then reports `NoResult`.
pub struct MockRecognizer {
    script: std::collections::VecDeque<RecognizerOutput>,
    fail: bool,
    accepted_blocks: usize,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            script: std::collections::VecDeque::new(),
            fail: false,
            accepted_blocks: 0,
        }
    }

    /// Appends outputs to the replay script.
    pub fn with_script(mut self, outputs: Vec<RecognizerOutput>) -> Self {
        self.script.extend(outputs);
        self
    }

    /// Configures every `accept_block` call to fail.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of blocks accepted so far.
    pub fn accepted_blocks(&self) -> usize {
        self.accepted_blocks
    }
}

impl Default for MockRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn accept_block(&mut self, _pcm: &[i16]) -> Result<RecognizerOutput> {
        if self.fail {
            return Err(RelayError::Recognition {
                message: "mock recognition failure".to_string(),
            });
        }
        self.accepted_blocks += 1;
        Ok(self.script.pop_front().unwrap_or(RecognizerOutput::NoResult))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_dir_resolves_existing_directory() {
        let root = tempfile::tempdir().unwrap();
        let expected = root.path().join(Language::English.model_dir_name());
        std::fs::create_dir_all(&expected).unwrap();

        let resolved = model_dir(root.path(), Language::English).unwrap();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn test_model_dir_missing_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        match model_dir(root.path(), Language::Russian) {
            Err(RelayError::ModelNotFound { path }) => {
                assert!(path.contains(Language::Russian.model_dir_name()));
            }
            _ => panic!("Expected ModelNotFound error"),
        }
    }

    #[test]
    fn test_mock_recognizer_replays_script() {
        let mut rec = MockRecognizer::new().with_script(vec![
            RecognizerOutput::Partial("he".to_string()),
            RecognizerOutput::Final("hello".to_string()),
        ]);

        assert_eq!(
            rec.accept_block(&[0; 10]).unwrap(),
            RecognizerOutput::Partial("he".to_string())
        );
        assert_eq!(
            rec.accept_block(&[0; 10]).unwrap(),
            RecognizerOutput::Final("hello".to_string())
        );
        assert_eq!(rec.accept_block(&[0; 10]).unwrap(), RecognizerOutput::NoResult);
        assert_eq!(rec.accepted_blocks(), 3);
    }

    #[test]
    fn test_mock_recognizer_failure() {
        let mut rec = MockRecognizer::new().with_failure();
        assert!(rec.accept_block(&[0; 10]).is_err());
    }

    #[test]
    fn test_recognizer_is_object_safe() {
        let mut rec: Box<dyn SpeechRecognizer> =
            Box::new(MockRecognizer::new().with_script(vec![RecognizerOutput::NoResult]));
        assert_eq!(rec.accept_block(&[]).unwrap(), RecognizerOutput::NoResult);
    }
}
