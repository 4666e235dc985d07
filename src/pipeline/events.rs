//! Status and transcript events emitted by the pipeline workers.

/// An observable pipeline event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// Short human-readable status line ("Listening...", error notes).
    Status(String),
    /// The current transcript view, including any bracketed partial.
    Transcript(String),
}

/// Trait for event consumers, allowing capture in tests.
pub trait StatusReporter: Send + Sync {
    fn report(&self, event: RelayEvent);
}

/// Default reporter: writes status lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, event: RelayEvent) {
        match event {
            RelayEvent::Status(message) => eprintln!("revoice: {}", message),
            RelayEvent::Transcript(text) => eprintln!("revoice: transcript: {}", text),
        }
    }
}

/// Reporter that records every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: std::sync::Mutex<Vec<RelayEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events received so far.
    pub fn events(&self) -> Vec<RelayEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Status messages only, in order.
    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RelayEvent::Status(s) => Some(s),
                RelayEvent::Transcript(_) => None,
            })
            .collect()
    }

    /// Transcript views only, in order.
    pub fn transcripts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RelayEvent::Transcript(t) => Some(t),
                RelayEvent::Status(_) => None,
            })
            .collect()
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, event: RelayEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_preserves_order() {
        let reporter = RecordingReporter::new();
        reporter.report(RelayEvent::Status("one".to_string()));
        reporter.report(RelayEvent::Transcript("hello".to_string()));
        reporter.report(RelayEvent::Status("two".to_string()));

        assert_eq!(reporter.statuses(), vec!["one", "two"]);
        assert_eq!(reporter.transcripts(), vec!["hello"]);
        assert_eq!(reporter.events().len(), 3);
    }

    #[test]
    fn test_reporter_is_object_safe() {
        let reporter: Box<dyn StatusReporter> = Box::new(LogReporter);
        reporter.report(RelayEvent::Status("ok".to_string()));
    }
}
