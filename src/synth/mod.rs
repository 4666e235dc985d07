//! Text-to-speech: voice selection, utterance queue and engine invocation.

pub mod engine;
pub mod queue;
pub mod voice;

pub use engine::{EspeakEngine, MockSynthesisEngine, SynthesisEngine};
pub use queue::{SynthesisQueue, Utterance};
pub use voice::{Gender, Language, VoiceSelector};
