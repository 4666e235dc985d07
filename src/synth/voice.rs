//! Voice selection: language and gender mapped to synthesizer voice ids.

use serde::{Deserialize, Serialize};

/// Recognition and synthesis language.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Russian,
    English,
}

impl Language {
    /// Stock model directory name for this language.
    pub fn model_dir_name(self) -> &'static str {
        match self {
            Language::Russian => "vosk-model-small-ru-0.22",
            Language::English => "vosk-model-small-en-us-0.15",
        }
    }

    /// ISO-style code, used in status lines.
    pub fn code(self) -> &'static str {
        match self {
            Language::Russian => "ru",
            Language::English => "en",
        }
    }
}

/// Synthesized voice gender.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Female,
    Male,
}

/// A complete voice selection.
///
/// Shared between the UI-facing controls and the synthesis worker; the
/// worker reads the current value when it dequeues an utterance, so
/// mid-queue changes apply to everything not yet synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoiceSelector {
    pub language: Language,
    pub gender: Gender,
}

impl VoiceSelector {
    pub fn new(language: Language, gender: Gender) -> Self {
        Self { language, gender }
    }

    /// The espeak-ng voice id for this selection.
    pub fn voice_id(self) -> &'static str {
        match (self.language, self.gender) {
            (Language::Russian, Gender::Female) => "ru+f3",
            (Language::Russian, Gender::Male) => "ru+m1",
            (Language::English, Gender::Female) => "en+f3",
            (Language::English, Gender::Male) => "en+m2",
        }
    }
}
