//! Partial/final transcript reconciliation.
//!
//! Recognizer outputs arrive as a stream of revisable partial hypotheses
//! punctuated by authoritative finals. The tracker folds them into a
//! display view ("finals [partial]") and decides which texts are worth
//! speaking: every final, plus debounced partials long enough to not be
//! noise.

use crate::defaults;
use std::time::{Duration, Instant};

/// Trait for time operations, allowing mock time in tests.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Real system clock using `std::time::Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// What the pipeline should do with a piece of reconciled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptAction {
    /// Publish the updated transcript view.
    Publish(String),
    /// Hand this text to the synthesis queue.
    Synthesize(String),
}

/// Folds recognizer outputs into a session transcript.
pub struct TranscriptTracker<C: Clock = SystemClock> {
    finals: Vec<String>,
    partial: String,
    last_publish: Option<Instant>,
    debounce: Duration,
    clock: C,
}

impl TranscriptTracker<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TranscriptTracker<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TranscriptTracker<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            finals: Vec::new(),
            partial: String::new(),
            last_publish: None,
            debounce: Duration::from_millis(defaults::PARTIAL_DEBOUNCE_MS),
            clock,
        }
    }

    /// The display view: space-joined finals, with the in-progress partial
    /// appended in brackets. A partial with no finals yet renders bare.
    pub fn view(&self) -> String {
        let finals = self.finals.join(" ");
        if self.partial.is_empty() {
            finals
        } else if finals.is_empty() {
            self.partial.clone()
        } else {
            format!("{} [{}]", finals, self.partial)
        }
    }

    /// Folds one recognizer output into the transcript.
    ///
    /// Returns the actions the caller should dispatch, in order.
    pub fn apply(&mut self, output: &crate::recognizer::RecognizerOutput) -> Vec<TranscriptAction> {
        use crate::recognizer::RecognizerOutput;

        match output {
            RecognizerOutput::Final(text) => self.apply_final(text),
            RecognizerOutput::Partial(text) => self.apply_partial(text),
            RecognizerOutput::NoResult => Vec::new(),
        }
    }

    fn apply_final(&mut self, text: &str) -> Vec<TranscriptAction> {
        let trimmed = text.trim();
        // A final supersedes whatever partial led up to it.
        self.partial.clear();
        self.last_publish = None;

        if trimmed.is_empty() {
            return vec![TranscriptAction::Publish(self.view())];
        }

        self.finals.push(trimmed.to_string());
        vec![
            TranscriptAction::Publish(self.view()),
            TranscriptAction::Synthesize(trimmed.to_string()),
        ]
    }

    fn apply_partial(&mut self, text: &str) -> Vec<TranscriptAction> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        // One debounce gate for publish and synthesis alike: a partial
        // passes when it changed, or when the window has elapsed since the
        // last publish (an unchanged partial is re-announced then).
        let now = self.clock.now();
        let changed = trimmed != self.partial;
        let window_elapsed = self
            .last_publish
            .is_none_or(|t| now.duration_since(t) >= self.debounce);
        if !changed && !window_elapsed {
            return Vec::new();
        }

        self.partial = trimmed.to_string();
        self.last_publish = Some(now);

        let mut actions = vec![TranscriptAction::Publish(self.view())];
        // Short fragments are shown but not worth voicing.
        if trimmed.chars().count() >= defaults::MIN_SYNTH_PARTIAL_CHARS {
            actions.push(TranscriptAction::Synthesize(trimmed.to_string()));
        }
        actions
    }

    /// Discards all transcript state. Called when a session starts.
    pub fn reset(&mut self) {
        self.finals.clear();
        self.partial.clear();
        self.last_publish = None;
    }
}
