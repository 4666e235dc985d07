//! Synthesis worker: serialized TTS and playback.
//!
//! One utterance at a time: dequeue, synthesize with the voice selected at
//! that moment, play to completion. A failed utterance is reported and
//! skipped; it is never retried, so one bad input cannot wedge the queue.

use crate::audio::playback::PlaybackSink;
use crate::defaults;
use crate::pipeline::events::{RelayEvent, StatusReporter};
use crate::synth::engine::SynthesisEngine;
use crate::synth::queue::SynthesisQueue;
use crate::synth::voice::VoiceSelector;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// State owned by the synthesis worker thread.
pub(crate) struct SynthesisWorker {
    pub queue: SynthesisQueue,
    pub engine: Box<dyn SynthesisEngine>,
    pub playback: Box<dyn PlaybackSink>,
    pub reporter: Arc<dyn StatusReporter>,
    pub voice: Arc<RwLock<VoiceSelector>>,
    pub running: Arc<AtomicBool>,
}

impl SynthesisWorker {
    /// Runs until the shared flag clears. Utterances still queued at that
    /// point are dropped with the queue.
    pub fn run(mut self) {
        let idle = Duration::from_millis(defaults::SYNTH_IDLE_BACKOFF_MS);

        while self.running.load(Ordering::Relaxed) {
            let Some(utterance) = self.queue.recv_timeout(idle) else {
                continue;
            };

            // The current selection wins over the enqueue-time snapshot, so
            // a voice change applies to everything not yet spoken.
            let voice = *self.voice.read().unwrap_or_else(|e| e.into_inner());

            let wav = match self.engine.synthesize(&utterance.text, voice) {
                Ok(wav) => wav,
                Err(e) => {
                    self.reporter
                        .report(RelayEvent::Status(format!("Synthesis failed: {}", e)));
                    continue;
                }
            };

            // The shared flag doubles as the cancellation signal, so a
            // session stop abandons an in-flight clip instead of waiting
            // for the device to drain it.
            if let Err(e) = self.playback.play_wav(&wav, &self.running) {
                self.reporter
                    .report(RelayEvent::Status(format!("Playback failed: {}", e)));
            }
        }
    }
}
