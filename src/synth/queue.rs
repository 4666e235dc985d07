//! Serialized utterance queue between recognition and synthesis.

use crate::defaults;
use crate::synth::voice::VoiceSelector;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One queued piece of text awaiting synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Trimmed text to speak.
    pub text: String,
    /// Voice selection at enqueue time. The synthesis worker prefers the
    /// current selection at dequeue time; this snapshot is kept for status
    /// reporting.
    pub voice: VoiceSelector,
}

/// FIFO queue feeding the synthesis worker.
///
/// Cloneable handle; the recognition worker holds a producer clone and the
/// synthesis worker the original. Text is trimmed on entry and utterances
/// below the minimum length are dropped silently.
#[derive(Clone)]
pub struct SynthesisQueue {
    tx: Sender<Utterance>,
    rx: Receiver<Utterance>,
    depth: Arc<AtomicUsize>,
}

impl SynthesisQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            depth: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Enqueues text for synthesis if it survives trimming.
    ///
    /// Returns `true` when the utterance was accepted.
    pub fn enqueue(&self, text: &str, voice: VoiceSelector) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() < defaults::MIN_UTTERANCE_CHARS {
            return false;
        }
        if self
            .tx
            .send(Utterance {
                text: trimmed.to_string(),
                voice,
            })
            .is_ok()
        {
            self.depth.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Waits up to `timeout` for the next utterance.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Utterance> {
        match self.rx.recv_timeout(timeout) {
            Ok(utterance) => {
                self.depth.fetch_sub(1, Ordering::Relaxed);
                Some(utterance)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Number of utterances waiting to be synthesized.
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SynthesisQueue {
    fn default() -> Self {
        Self::new()
    }
}
