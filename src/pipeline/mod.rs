//! The relay pipeline: recognition and synthesis workers plus their
//! lifecycle controller.

pub mod controller;
pub mod events;
mod recognition;
mod synthesis;
pub mod transcript;

pub use controller::{PipelineState, RelayBackend, RelayController, RelayOptions};
pub use events::{LogReporter, RecordingReporter, RelayEvent, StatusReporter};
pub use transcript::{Clock, SystemClock, TranscriptAction, TranscriptTracker};
